pub mod error;
pub mod object_id;

pub use object_id::ObjectId;
