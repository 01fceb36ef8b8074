use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use roster_config::{RosterConfig, SheetsBackend, SheetsConfig};
use roster_sheets::{GoogleSheets, MemorySheets, SheetStore};

const REDACTED: &str = "<redacted>";

/// Load `.env`, then the layered configuration.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<RosterConfig> {
    RosterConfig::load_with_dotenv(explicit).context("failed to load roster configuration")
}

/// The effective configuration as TOML, with the bot token masked.
pub fn render_config(config: &RosterConfig) -> anyhow::Result<String> {
    let mut shown = config.clone();
    if shown.telegram.is_configured() {
        shown.telegram.token = REDACTED.to_string();
    }
    toml::to_string_pretty(&shown).context("failed to render configuration")
}

/// Fail unless the spreadsheet section is usable on its own.
pub fn require_sheets(config: &SheetsConfig) -> anyhow::Result<()> {
    let missing = config.missing_fields();
    if !missing.is_empty() {
        anyhow::bail!(
            "sheets backend '{}' is not configured: missing {}",
            config.backend,
            missing.join(", ")
        );
    }
    Ok(())
}

/// Open the spreadsheet store selected by `config.backend`.
pub async fn open_store(config: &SheetsConfig) -> anyhow::Result<Arc<dyn SheetStore>> {
    match config.backend {
        SheetsBackend::Google => {
            let key_path = config
                .credentials_path
                .as_deref()
                .context("sheets.credentials_path is not set")?;
            let store = GoogleSheets::from_key_file(
                key_path,
                &config.spreadsheet_id,
                &config.api_base,
                &config.token_uri,
            )
            .await
            .with_context(|| {
                format!(
                    "failed to load service account key from {}",
                    key_path.display()
                )
            })?;
            tracing::info!(spreadsheet = %config.spreadsheet_id, "using google sheets backend");
            Ok(Arc::new(store))
        }
        SheetsBackend::Memory => {
            tracing::warn!("using in-memory sheets backend; records are lost on exit");
            Ok(Arc::new(MemorySheets::new()))
        }
    }
}
