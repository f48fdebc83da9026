use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::storage::{ExternalChange, Storage, StorageError};
use super::watcher::{FileEvent, StoreWatcher};

/// File-backed storage: one `<key>.json` file per key in a data directory.
///
/// Writes are atomic (temp file + rename). The last payload written for
/// each key is remembered so the watcher never reports our own writes back
/// as external changes.
pub struct FileStorage {
    dir: PathBuf,
    last_written: HashMap<String, String>,
    watched: HashSet<String>,
    watcher: Option<StoreWatcher>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage {
            dir: dir.into(),
            last_written: HashMap::new(),
            watched: HashSet::new(),
            watcher: None,
        }
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn key_for(path: &Path) -> Option<String> {
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            return None;
        }
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        atomic_write(&self.dir, &path, value.as_bytes())
            .map_err(|source| StorageError::Write { path, source })?;
        self.last_written.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn watch(&mut self, key: &str) -> Result<(), StorageError> {
        if self.watcher.is_none() {
            let watcher = StoreWatcher::start(&self.dir).map_err(|source| StorageError::Watch {
                path: self.dir.clone(),
                source,
            })?;
            self.watcher = Some(watcher);
        }
        self.watched.insert(key.to_string());
        Ok(())
    }

    fn poll_changes(&mut self) -> Vec<ExternalChange> {
        let Some(watcher) = &self.watcher else {
            return Vec::new();
        };

        // Collapse bursts of events into one re-read per key
        let mut keys = BTreeSet::new();
        for FileEvent::Changed(paths) in watcher.poll() {
            keys.extend(
                paths
                    .iter()
                    .filter_map(|p| Self::key_for(p))
                    .filter(|k| self.watched.contains(k)),
            );
        }

        let mut changes = Vec::new();
        for key in keys {
            let payload = match self.read(&key) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(key = %key, "could not re-read changed file: {e}");
                    continue;
                }
            };
            if payload.is_some() && payload.as_ref() == self.last_written.get(&key) {
                continue;
            }
            if let Some(content) = &payload {
                // Later writes of ours must not be confused with this one
                self.last_written.insert(key.clone(), content.clone());
            }
            changes.push(ExternalChange { key, payload });
        }
        changes
    }
}

/// Write via a temp file in the same directory, then rename over `path`.
fn atomic_write(dir: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
