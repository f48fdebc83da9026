use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// What the watcher callback hands to `FileStorage`.
#[derive(Debug)]
pub enum FileEvent {
    /// `.json` files in the data directory that were created, modified or removed
    Changed(Vec<PathBuf>),
}

/// Watches the data directory and queues changed key files until polled.
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl StoreWatcher {
    /// Watch `data_dir` itself; subdirectories are ignored.
    pub fn start(data_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result.inspect_err(|e| tracing::debug!("watcher error: {e}")) else {
                    return;
                };
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                let changed: Vec<PathBuf> =
                    event.paths.into_iter().filter(|p| is_key_file(p)).collect();
                if !changed.is_empty() {
                    // Receiver gone means the storage was dropped; nothing to do
                    let _ = tx.send(FileEvent::Changed(changed));
                }
            },
            Config::default(),
        )?;

        watcher.watch(data_dir, RecursiveMode::NonRecursive)?;
        Ok(StoreWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Drain everything queued since the last call. Never blocks; the shell
    /// calls this (through `Storage::poll_changes`) before each command.
    pub fn poll(&self) -> Vec<FileEvent> {
        self.rx.try_iter().collect()
    }
}

/// A visible `<key>.json` file. Atomic writes go through hidden temp files,
/// so only the renamed target counts.
fn is_key_file(path: &Path) -> bool {
    let visible = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| !n.starts_with('.'));
    visible && path.extension().and_then(|e| e.to_str()) == Some("json")
}
