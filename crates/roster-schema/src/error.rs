//! Schema error types.

use roster_core::errors::CoreError;
use roster_sheets::SheetsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// A rule cell could not be parsed.
    #[error("invalid rule for '{column}' in table '{table}': {source}")]
    InvalidRule {
        table: String,
        column: String,
        source: CoreError,
    },

    #[error(transparent)]
    Sheets(#[from] SheetsError),
}

impl SchemaError {
    /// Translate a gateway error raised while touching `table`.
    pub(crate) fn from_gateway(table: &str, err: SheetsError) -> Self {
        match err {
            SheetsError::NotFound(_) => Self::TableNotFound(table.to_string()),
            other => Self::Sheets(other),
        }
    }
}
