use std::path::Path;

use tracing::warn;

use crate::cli::commands::InitArgs;
use crate::io::config_io;
use crate::io::store::CellStore;
use crate::model::config::AppConfig;

pub fn cmd_init(data_dir: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_io::config_path(data_dir);
    if config_path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }

    let config = match config_io::read_config(data_dir) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %config_path.display(), error = %e, "replacing unreadable config with defaults");
            AppConfig::default()
        }
    };
    config_io::write_config(data_dir, &config)?;

    let db_path = config_io::db_path(data_dir, &config);
    CellStore::open(&db_path)?;

    println!("Initialized daygrid in {}", data_dir.display());
    println!("  config:   {}", config_path.display());
    println!("  database: {}", db_path.display());
    Ok(())
}
