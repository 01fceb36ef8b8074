//! Per-conversation intake state.

use std::fmt;

use roster_core::record::Record;
use serde::{Deserialize, Serialize};

/// Everything the intake machine remembers about one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Table that free-form submissions and searches target.
    pub table: Option<String>,
    pub state: IntakeState,
    /// Step handed to the next column question. Only ever grows, so a button
    /// from an earlier negotiation never matches a later one.
    #[serde(default)]
    pub next_step: u32,
}

impl Session {
    /// The open negotiation, if any.
    #[must_use]
    pub const fn negotiation(&self) -> Option<&PendingNegotiation> {
        match &self.state {
            IntakeState::NegotiatingColumn(pending) => Some(pending),
            _ => None,
        }
    }

    /// The state to fall back to once the current interaction finishes.
    #[must_use]
    pub fn resting_state(&self) -> IntakeState {
        if self.table.is_some() {
            IntakeState::AwaitingFreeForm
        } else {
            IntakeState::Idle
        }
    }
}

/// Where a conversation is in the intake protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntakeState {
    /// No table selected.
    #[default]
    Idle,
    /// A table is selected; text messages are free-form records.
    AwaitingFreeForm,
    /// The next text message names a table to create or open.
    AwaitingTableName,
    /// A submission introduced columns the table lacks.
    NegotiatingColumn(PendingNegotiation),
    /// Step-by-step entry, one column per message.
    AwaitingFieldValue(FieldCursor),
}

impl IntakeState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingFreeForm => "awaiting_free_form",
            Self::AwaitingTableName => "awaiting_table_name",
            Self::NegotiatingColumn(_) => "negotiating_column",
            Self::AwaitingFieldValue(_) => "awaiting_field_value",
        }
    }
}

impl fmt::Display for IntakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open schema-extension negotiation.
///
/// `pending` shrinks by one column per decision. When it is empty the record
/// is ready to commit; a negotiation that stays open with nothing pending is
/// one whose commit failed and can be retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNegotiation {
    pub table: String,
    pub record: Record,
    pub pending: Vec<String>,
    /// Step of the question currently asked, drawn from
    /// [`Session::next_step`]. Decisions carry the step they answer so that
    /// a second press of an old button is rejected.
    pub step: u32,
}

impl PendingNegotiation {
    /// The column currently being asked about.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.pending.first().map(String::as_str)
    }
}

/// Cursor over the columns of a step-by-step entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCursor {
    pub table: String,
    /// Columns prompted for, in sheet order. Audit columns are excluded.
    pub columns: Vec<String>,
    pub position: usize,
    pub record: Record,
}

impl FieldCursor {
    /// The column currently being asked for, or `None` once every column has
    /// a value.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.columns.get(self.position).map(String::as_str)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.position >= self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resting_state_depends_on_table() {
        let mut session = Session::default();
        assert_eq!(session.resting_state(), IntakeState::Idle);
        session.table = Some("Students".into());
        assert_eq!(session.resting_state(), IntakeState::AwaitingFreeForm);
    }

    #[test]
    fn cursor_reports_completion() {
        let mut cursor = FieldCursor {
            table: "T".into(),
            columns: vec!["name".into(), "age".into()],
            position: 1,
            record: Record::new(),
        };
        assert_eq!(cursor.current(), Some("age"));
        cursor.position = 2;
        assert!(cursor.is_complete());
        assert_eq!(cursor.current(), None);
    }
}
