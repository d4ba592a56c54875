use serde::{Deserialize, Serialize};

use super::grid::{DEFAULT_DONE_TOKENS, DEFAULT_REPEAT_TAG};

/// Configuration from daygrid.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub rollover: RolloverConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file, relative to the data directory unless absolute
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloverConfig {
    /// Done-flag contents that mark a row complete
    #[serde(default = "default_done_tokens")]
    pub done_tokens: Vec<String>,
}

impl Default for RolloverConfig {
    fn default() -> Self {
        RolloverConfig {
            done_tokens: default_done_tokens(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_repeat_tag")]
    pub repeat_tag: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            repeat_tag: default_repeat_tag(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// tracing filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: default_log_filter(),
        }
    }
}

fn default_db_path() -> String {
    "tasks.db".to_string()
}

fn default_done_tokens() -> Vec<String> {
    DEFAULT_DONE_TOKENS.iter().map(|t| t.to_string()).collect()
}

fn default_repeat_tag() -> String {
    DEFAULT_REPEAT_TAG.to_string()
}

fn default_log_filter() -> String {
    "warn".to_string()
}
