//! # roster-schema
//!
//! Table model for Roster.
//!
//! - [`SchemaCatalog`]: cached, append-only column lists per table
//! - [`RuleResolver`]: validation of candidate values against the rule row
//! - [`templates`]: built-in `Students`, `Teachers` and `StudentProgress`
//!   layouts

pub mod catalog;
pub mod rules;
pub mod table;
pub mod templates;

mod error;

pub use catalog::SchemaCatalog;
pub use error::SchemaError;
pub use rules::{FieldFailure, RuleResolver, RuleRow, Verdict};
pub use table::Table;
pub use templates::{Provisioned, TableTemplate, ensure_template};
