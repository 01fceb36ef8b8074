//! Intake error types.

use roster_schema::{FieldFailure, SchemaError};
use roster_search::SearchError;
use roster_sheets::SheetsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    /// The submission contained no `name: value` line.
    #[error("no fields found; send one `name: value` pair per line")]
    EmptyRecord,

    /// A new submission arrived while a column negotiation is open.
    #[error("finish the open negotiation for '{table}' first (pending: {})", .pending.join(", "))]
    NegotiationInProgress { table: String, pending: Vec<String> },

    #[error("no table selected")]
    NoTableSelected,

    /// A column decision arrived with no negotiation open.
    #[error("there is no column decision waiting")]
    NoNegotiation,

    /// A field value arrived while no step-by-step entry is running.
    #[error("no field value was asked for")]
    NotAwaitingValue,

    /// A column decision arrived for a step that was already answered.
    #[error("that question was already answered")]
    StaleDecision,

    /// One or more submitted values broke their column's rule.
    #[error("validation failed for {}", failed_columns(.0))]
    ValidationFailed(Vec<FieldFailure>),

    #[error("'{0}' is not a usable table name")]
    InvalidTableName(String),

    /// Step-by-step entry needs at least one column to prompt for.
    #[error("table '{0}' has no columns yet")]
    NoColumns(String),

    /// No row matched an update's search condition.
    #[error("no row in '{table}' has {column} = '{value}'")]
    NoMatch {
        table: String,
        column: String,
        value: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Sheets(#[from] SheetsError),
}

impl IntakeError {
    /// Whether the error was caused by the user's input rather than by the
    /// spreadsheet store. User errors are answered with a re-prompt.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(
            self,
            Self::Sheets(_)
                | Self::Schema(SchemaError::Sheets(_) | SchemaError::InvalidRule { .. })
        )
    }
}

impl From<SearchError> for IntakeError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Schema(e) => Self::Schema(e),
            SearchError::Sheets(e) => Self::Sheets(e),
        }
    }
}

fn failed_columns(failures: &[FieldFailure]) -> String {
    failures
        .iter()
        .map(|f| f.column.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
