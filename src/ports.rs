pub mod storage;
pub mod time;

pub use storage::{KeyValueStore, StorageError};
pub use time::TimeProvider;
