use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::config::AppConfig;

/// File name of the config inside the data directory
pub const CONFIG_FILE: &str = "daygrid.toml";

/// Error type for config I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse daygrid.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not serialize daygrid.toml: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Read the config from the data directory. A missing file yields defaults.
pub fn read_config(data_dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = config_path(data_dir);
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Write the config atomically (temp file + rename).
pub fn write_config(data_dir: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let path = config_path(data_dir);
    let text = toml::to_string_pretty(config)?;
    atomic_write(&path, text.as_bytes()).map_err(|e| ConfigError::WriteError { path, source: e })
}

/// Resolve the database file for a config: relative paths live under `data_dir`
pub fn db_path(data_dir: &Path, config: &AppConfig) -> PathBuf {
    let path = Path::new(&config.store.path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}

fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
