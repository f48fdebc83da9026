use std::fs;
use std::path::{Path, PathBuf};

use crate::io::config_io::{self, CONFIG_FILE};
use crate::io::file_storage::FileStorage;
use crate::model::config::Config;

/// Directory holding config and data, created by `tl init`
pub const DATA_DIR: &str = ".ticklist";

/// Error type for locating and loading a workspace
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("not a ticklist workspace: no .ticklist/ directory found (run `tl init`)")]
    NotAProject,
    #[error("ticklist workspace already exists at {0} (use --force to rewrite the config)")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A discovered workspace: where it lives and how it is configured
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub config: Config,
}

impl Workspace {
    /// File-backed storage rooted in this workspace's data directory
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(&self.data_dir)
    }
}

/// Walk up from `start` looking for `.ticklist/config.toml`.
pub fn discover_root(start: &Path) -> Result<PathBuf, ProjectError> {
    let mut current = start.to_path_buf();
    loop {
        let data_dir = current.join(DATA_DIR);
        if data_dir.is_dir() && data_dir.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ProjectError::NotAProject);
        }
    }
}

/// Load the workspace rooted at `root`.
pub fn load_workspace(root: &Path) -> Result<Workspace, ProjectError> {
    let data_dir = root.join(DATA_DIR);
    if !data_dir.is_dir() {
        return Err(ProjectError::NotAProject);
    }
    let config = config_io::read_config(&data_dir)?;
    Ok(Workspace {
        root: root.to_path_buf(),
        data_dir,
        config,
    })
}

/// Create `.ticklist/` with a default config under `root`.
/// With `force`, an existing config is replaced; stored todos are kept.
pub fn init_workspace(root: &Path, force: bool) -> Result<Workspace, ProjectError> {
    let data_dir = root.join(DATA_DIR);
    if data_dir.join(CONFIG_FILE).exists() && !force {
        return Err(ProjectError::AlreadyExists(data_dir));
    }
    fs::create_dir_all(&data_dir)?;
    config_io::write_template(&data_dir)?;
    load_workspace(root)
}
