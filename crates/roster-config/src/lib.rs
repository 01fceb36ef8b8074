//! # roster-config
//!
//! Layered configuration loading for Roster using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`ROSTER_*` prefix, `__` as separator)
//! 2. Legacy variables `TELEGRAM_BOT_TOKEN`, `GOOGLE_SHEET_ID`,
//!    `GOOGLE_CREDENTIALS_PATH` and `LOG_LEVEL`
//! 3. Project-level `roster.toml`, or the file passed with `--config`
//! 4. User-level `~/.config/roster/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `ROSTER_TELEGRAM__TOKEN` -> `telegram.token`,
//! `ROSTER_SHEETS__SPREADSHEET_ID` -> `sheets.spreadsheet_id`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use roster_config::RosterConfig;
//!
//! let config = RosterConfig::load_with_dotenv(None).expect("config");
//! config.validate().expect("bot is configured");
//! println!("backend: {}", config.sheets.backend);
//! ```

mod error;
mod general;
mod logging;
mod sheets;
mod telegram;

pub use error::ConfigError;
pub use general::GeneralConfig;
pub use logging::LoggingConfig;
pub use sheets::{SheetsBackend, SheetsConfig};
pub use telegram::TelegramConfig;

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
    value::Uncased,
};
use serde::{Deserialize, Serialize};

/// Environment variables accepted without the `ROSTER_` prefix, and the key
/// each one sets.
const LEGACY_ENV: [(&str, &str); 4] = [
    ("TELEGRAM_BOT_TOKEN", "telegram.token"),
    ("GOOGLE_SHEET_ID", "sheets.spreadsheet_id"),
    ("GOOGLE_CREDENTIALS_PATH", "sheets.credentials_path"),
    ("LOG_LEVEL", "logging.level"),
];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl RosterConfig {
    /// Load configuration from all sources.
    ///
    /// `explicit` replaces the project-local `roster.toml` when given.
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for that.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit.filter(|p| !p.exists()) {
            return Err(ConfigError::InvalidValue {
                field: "--config".into(),
                reason: format!("{} does not exist", path.display()),
            });
        }
        Self::figment(explicit).extract().map_err(ConfigError::from)
    }

    /// Load `.env` from the working directory, then [`Self::load`].
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(explicit)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer extra providers.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path().filter(|p| p.exists()) {
            figment = figment.merge(Toml::file(global_path));
        }

        match explicit {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                let local_path = PathBuf::from("roster.toml");
                if local_path.exists() {
                    figment = figment.merge(Toml::file(local_path));
                }
            }
        }

        figment
            .merge(Self::legacy_env())
            .merge(Env::prefixed("ROSTER_").split("__"))
    }

    /// Check that every section the selected backend needs is filled in.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.telegram.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "telegram".into(),
                missing: "token".into(),
            });
        }
        let missing = self.sheets.missing_fields();
        if !missing.is_empty() {
            return Err(ConfigError::NotConfigured {
                section: "sheets".into(),
                missing: missing.join(", "),
            });
        }
        if self.general.result_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.result_limit".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    fn legacy_env() -> Env {
        let names = LEGACY_ENV.map(|(var, _)| var);
        Env::raw().only(&names).map(|key| {
            LEGACY_ENV
                .iter()
                .find(|(var, _)| key.as_str().eq_ignore_ascii_case(var))
                .map_or_else(|| Uncased::from(key.as_str()), |(_, path)| Uncased::from(*path))
        })
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("roster").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_not_valid() {
        let config = RosterConfig::default();
        assert!(!config.telegram.is_configured());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotConfigured { ref section, .. }) if section == "telegram"
        ));
    }

    #[test]
    fn memory_backend_only_needs_a_token() {
        let mut config = RosterConfig::default();
        config.telegram.token = "123:abc".into();
        config.sheets.backend = SheetsBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn google_backend_reports_every_missing_field() {
        let mut config = RosterConfig::default();
        config.telegram.token = "123:abc".into();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration section 'sheets' is not configured (missing spreadsheet_id, credentials_path)"
        );
    }

    #[test]
    fn zero_result_limit_is_rejected() {
        let mut config = RosterConfig::default();
        config.telegram.token = "123:abc".into();
        config.sheets.backend = SheetsBackend::Memory;
        config.general.result_limit = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
