pub mod config_io;
pub mod file_storage;
pub mod project_io;
pub mod storage;
pub mod watcher;

pub use file_storage::FileStorage;
pub use storage::{ExternalChange, MemoryStorage, Storage, StorageError};
