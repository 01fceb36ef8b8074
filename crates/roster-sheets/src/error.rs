//! Spreadsheet gateway error types.

use thiserror::Error;

/// Errors raised by a [`SheetStore`](crate::SheetStore) backend.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// The table (sheet) or range does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A table with this name already exists.
    #[error("table '{0}' already exists")]
    AlreadyExists(String),

    /// The spreadsheet API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials could not be loaded or exchanged for a token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A response or key file could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetsError {
    /// Whether this is a [`SheetsError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
