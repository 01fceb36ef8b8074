//! # roster-intake
//!
//! Conversation-level record intake.
//!
//! A submission whose fields all have columns is appended directly. A
//! submission naming columns the table lacks opens a negotiation: each new
//! column is accepted (added to the header) or declined (dropped from the
//! record) one at a time, and the record is appended once none remain.
//!
//! The [`Intake`] machine is shared by all conversations; each conversation
//! owns a [`Session`].

pub mod machine;
pub mod parse;
pub mod session;

mod error;

pub use error::IntakeError;
pub use machine::{Intake, MAX_TABLE_NAME_LEN, Outcome};
pub use parse::parse_fields;
pub use session::{FieldCursor, IntakeState, PendingNegotiation, Session};
