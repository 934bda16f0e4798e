pub use infbk_types::error::{ErrorKind, InfbkError, Result, StoreError, StoreResult};
