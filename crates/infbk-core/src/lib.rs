pub mod archive;
pub mod collect;
pub mod compress;
pub mod config;
pub mod error;
pub mod model;
pub mod restore;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;
#[cfg(test)]
mod testutil;
