pub(crate) mod backup;
pub(crate) mod config;
pub(crate) mod inspect;
pub(crate) mod restore;
