//! Telegram bot configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`.
    #[serde(default)]
    pub token: String,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.token.trim().is_empty()
    }
}
