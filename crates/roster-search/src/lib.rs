//! # roster-search
//!
//! Exact and fuzzy lookup of rows by one column's value.
//!
//! Only data rows are scanned (row 3 onwards). Results are
//! [`RowMap`](roster_core::row::RowMap)s built against the table's current
//! column list.

pub mod distance;
pub mod engine;

mod error;

pub use distance::{is_fuzzy_match, levenshtein};
pub use engine::{SearchEngine, SearchMode};
pub use error::SearchError;
