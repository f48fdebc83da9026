use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io::CONFIG_FILE;
use crate::io::project_io;

pub fn cmd_init(start: &Path, args: InitArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let workspace = project_io::init_workspace(start, args.force)?;
    let config_path = workspace.data_dir.join(CONFIG_FILE);
    if json {
        let value = serde_json::json!({
            "root": workspace.root,
            "config": config_path,
            "key": workspace.config.store.key,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Initialized ticklist in {}", workspace.root.display());
        println!("  config: {}", config_path.display());
        println!(
            "  todos:  {}",
            workspace.storage().path_for(&workspace.config.store.key).display()
        );
    }
    Ok(())
}
