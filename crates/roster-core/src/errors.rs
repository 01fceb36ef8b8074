//! Parsing errors for core types.
//!
//! Domain errors with remote or protocol context (`SheetsError`,
//! `SchemaError`, `IntakeError`) live in their respective crates; the binary
//! converges them through `anyhow`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A rule cell did not start with a known `kind:` prefix.
    #[error("Invalid rule '{0}': expected 'regex:<pattern>' or 'list:<values>'")]
    InvalidRule(String),

    /// A range reference such as `Students!A:A` could not be parsed.
    #[error("Invalid range reference '{0}'")]
    InvalidRange(String),
}
