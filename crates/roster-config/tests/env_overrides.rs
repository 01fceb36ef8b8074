use figment::Jail;
use pretty_assertions::assert_eq;
use roster_config::{RosterConfig, SheetsBackend};

#[test]
fn prefixed_env_sets_nested_keys() {
    Jail::expect_with(|jail| {
        jail.set_env("ROSTER_TELEGRAM__TOKEN", "env-token");
        jail.set_env("ROSTER_SHEETS__BACKEND", "memory");
        jail.set_env("ROSTER_GENERAL__RESULT_LIMIT", "25");

        let config = RosterConfig::load(None).expect("config loads");
        assert_eq!(config.telegram.token, "env-token");
        assert_eq!(config.sheets.backend, SheetsBackend::Memory);
        assert_eq!(config.general.result_limit, 25);
        Ok(())
    });
}

#[test]
fn legacy_variables_are_understood() {
    Jail::expect_with(|jail| {
        jail.set_env("TELEGRAM_BOT_TOKEN", "legacy-token");
        jail.set_env("GOOGLE_SHEET_ID", "legacy-sheet");
        jail.set_env("GOOGLE_CREDENTIALS_PATH", "/tmp/key.json");
        jail.set_env("LOG_LEVEL", "warn");

        let config = RosterConfig::load(None).expect("config loads");
        assert_eq!(config.telegram.token, "legacy-token");
        assert_eq!(config.sheets.spreadsheet_id, "legacy-sheet");
        assert_eq!(
            config.sheets.credentials_path.as_deref(),
            Some(std::path::Path::new("/tmp/key.json"))
        );
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
        Ok(())
    });
}

#[test]
fn prefixed_env_beats_legacy_and_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("roster.toml", "[telegram]\ntoken = \"from-toml\"\n")?;
        jail.set_env("TELEGRAM_BOT_TOKEN", "from-legacy");
        jail.set_env("ROSTER_TELEGRAM__TOKEN", "from-prefixed");

        let config = RosterConfig::load(None).expect("config loads");
        assert_eq!(config.telegram.token, "from-prefixed");
        Ok(())
    });
}

#[test]
fn legacy_env_beats_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("roster.toml", "[logging]\nlevel = \"trace\"\n")?;
        jail.set_env("LOG_LEVEL", "error");

        let config = RosterConfig::load(None).expect("config loads");
        assert_eq!(config.logging.level, "error");
        Ok(())
    });
}
