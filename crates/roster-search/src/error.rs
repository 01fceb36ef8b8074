//! Search error types.

use roster_schema::SchemaError;
use roster_sheets::SheetsError;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Unknown table or column.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Rows could not be read.
    #[error(transparent)]
    Sheets(#[from] SheetsError),
}
