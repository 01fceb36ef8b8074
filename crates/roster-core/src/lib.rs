//! # roster-core
//!
//! Core types shared by every Roster crate.
//!
//! - [`record::Record`]: an ordered, case-insensitive field map submitted by a user
//! - [`row::RowMap`]: a stored row read back as column → value pairs
//! - [`rule::Rule`]: per-column validation directives kept in the rule row
//! - [`audit::AuditStamp`]: creation/modification bookkeeping columns
//! - [`a1`]: A1-notation helpers for column letters and cell references
//! - [`errors::CoreError`]: errors raised while parsing the above

pub mod a1;
pub mod audit;
pub mod errors;
pub mod record;
pub mod row;
pub mod rule;

/// 1-based index of the header row.
pub const HEADER_ROW: u32 = 1;

/// 1-based index of the reserved validation rule row.
pub const RULE_ROW: u32 = 2;

/// 1-based index of the first data row.
pub const DATA_START_ROW: u32 = 3;

/// Number of rows frozen at the top of every provisioned table.
pub const FROZEN_ROWS: u32 = 2;

/// Case-folded form of a column or field name, used as a lookup key.
#[must_use]
pub fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether two column or field names refer to the same column.
#[must_use]
pub fn same_name(a: &str, b: &str) -> bool {
    fold_name(a) == fold_name(b)
}
