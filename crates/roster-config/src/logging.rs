//! Log output configuration.

use serde::{Deserialize, Serialize};

fn default_level() -> String {
    "info".to_string()
}

fn default_directory() -> String {
    "logs".to_string()
}

fn default_file_prefix() -> String {
    "roster.log".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when `ROSTER_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for daily rolling log files. Empty disables file output.
    #[serde(default = "default_directory")]
    pub directory: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: default_directory(),
            file_prefix: default_file_prefix(),
        }
    }
}

impl LoggingConfig {
    pub fn writes_files(&self) -> bool {
        !self.directory.trim().is_empty()
    }
}
