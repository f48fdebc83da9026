use std::fs;
use std::path::Path;

use crate::io::project_io::ProjectError;
use crate::model::config::Config;

/// Name of the config file inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Written by `tl init`. Every value shown is the default.
pub const CONFIG_TEMPLATE: &str = "\
# ticklist configuration

[store]
# Storage key; the collection lives in <key>.json next to this file
key = \"todos\"

[view]
# Starting filter for `list` and `shell`: all | active | completed
filter = \"all\"
# Starting order: newest | oldest | alphabetical | priority
sort = \"newest\"

[ui]
# Todo text wider than this many terminal cells is truncated in listings
width = 72
";

/// Read and parse the config from the data directory.
pub fn read_config(data_dir: &Path) -> Result<Config, ProjectError> {
    let config_path = data_dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|e| ProjectError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: Config = toml::from_str(&config_text)?;
    Ok(config)
}

/// Write the starting config template into the data directory.
pub fn write_template(data_dir: &Path) -> Result<(), ProjectError> {
    fs::write(data_dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;
    Ok(())
}
