#![forbid(unsafe_code)]

pub mod file;
pub mod progress_store;
pub mod repository;

pub use file::FileStore;
pub use progress_store::{PROGRESS_KEY, ProgressStore};
pub use repository::{InMemoryStore, KeyValueStore, StorageError};
