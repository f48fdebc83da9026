use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;

/// Error type for persistence backends
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not watch {path}: {source}")]
    Watch {
        path: PathBuf,
        source: notify::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A value changed by someone other than this process's own writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalChange {
    pub key: String,
    /// New serialized value, or `None` if the key was removed
    pub payload: Option<String>,
}

/// Durable key → value store with a change-notification channel.
///
/// Notifications are pulled: the event loop calls [`Storage::poll_changes`]
/// between commands, so the store is only ever touched from one thread.
pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Start reporting external changes to `key`.
    fn watch(&mut self, key: &str) -> Result<(), StorageError>;

    /// Non-blocking drain of external changes seen since the last call.
    fn poll_changes(&mut self) -> Vec<ExternalChange>;
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    watched: HashSet<String>,
    pending: Vec<ExternalChange>,
    writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

/// In-memory storage. Clones share the same contents, so a test can keep a
/// handle after moving one into a store and play the "other writer".
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with one value
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage
            .inner
            .borrow_mut()
            .values
            .insert(key.to_string(), value.to_string());
        storage
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.inner.borrow().values.get(key).cloned()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Simulate another writer replacing `key`.
    pub fn external_write(&self, key: &str, value: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.values.insert(key.to_string(), value.to_string());
        if inner.watched.contains(key) {
            inner.pending.push(ExternalChange {
                key: key.to_string(),
                payload: Some(value.to_string()),
            });
        }
    }

    /// Simulate another writer removing `key`.
    pub fn external_remove(&self, key: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.values.remove(key);
        if inner.watched.contains(key) {
            inner.pending.push(ExternalChange {
                key: key.to_string(),
                payload: None,
            });
        }
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.inner.borrow();
        if inner.fail_reads {
            return Err(StorageError::Unavailable(format!("read of {key} refused")));
        }
        Ok(inner.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(StorageError::Unavailable(format!("write of {key} refused")));
        }
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn watch(&mut self, key: &str) -> Result<(), StorageError> {
        self.inner.borrow_mut().watched.insert(key.to_string());
        Ok(())
    }

    fn poll_changes(&mut self) -> Vec<ExternalChange> {
        std::mem::take(&mut self.inner.borrow_mut().pending)
    }
}
