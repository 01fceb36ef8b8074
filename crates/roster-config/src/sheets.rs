//! Spreadsheet store configuration.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_api_base() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Which spreadsheet backend the bot talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetsBackend {
    /// Google Sheets v4 REST API.
    #[default]
    Google,
    /// In-process store. Data is lost on exit.
    Memory,
}

impl SheetsBackend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for SheetsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub backend: SheetsBackend,

    /// Spreadsheet id from the document URL.
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Path to the service-account JSON key.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// OAuth token endpoint used for the JWT bearer grant. Overrides the
    /// `token_uri` field of the key file when set.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            backend: SheetsBackend::default(),
            spreadsheet_id: String::new(),
            credentials_path: None,
            api_base: default_api_base(),
            token_uri: default_token_uri(),
        }
    }
}

impl SheetsConfig {
    /// Names of the fields the selected backend still needs.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.backend == SheetsBackend::Google {
            if self.spreadsheet_id.trim().is_empty() {
                missing.push("spreadsheet_id");
            }
            if self.credentials_path.is_none() {
                missing.push("credentials_path");
            }
        }
        missing
    }

    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }
}
