//! Audit bookkeeping columns.
//!
//! Provisioned tables carry four audit columns. They are filled by the
//! caller, never prompted for and never validated.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Record;

pub const CREATED: &str = "created";
pub const CREATED_BY: &str = "created_by";
pub const LAST_MODIFIED: &str = "last_modified";
pub const LAST_MODIFIED_BY: &str = "last_modified_by";

/// All audit column names, in provisioning order.
pub const AUDIT_COLUMNS: [&str; 4] = [CREATED, CREATED_BY, LAST_MODIFIED, LAST_MODIFIED_BY];

/// Whether `column` is one of the audit columns.
#[must_use]
pub fn is_audit_column(column: &str) -> bool {
    AUDIT_COLUMNS.iter().any(|c| crate::same_name(c, column))
}

/// Who did something, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub at: DateTime<Utc>,
    pub actor: String,
}

impl AuditStamp {
    #[must_use]
    pub fn now(actor: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            actor: actor.into(),
        }
    }

    fn timestamp(&self) -> String {
        self.at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Fields stamped on a newly created row.
    #[must_use]
    pub fn creation_fields(&self) -> Record {
        let ts = self.timestamp();
        [
            (CREATED, ts.clone()),
            (CREATED_BY, self.actor.clone()),
            (LAST_MODIFIED, ts),
            (LAST_MODIFIED_BY, self.actor.clone()),
        ]
        .into_iter()
        .collect()
    }

    /// Fields stamped on an updated row.
    #[must_use]
    pub fn modification_fields(&self) -> Record {
        [
            (LAST_MODIFIED, self.timestamp()),
            (LAST_MODIFIED_BY, self.actor.clone()),
        ]
        .into_iter()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn stamp() -> AuditStamp {
        AuditStamp {
            at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            actor: "amira".to_string(),
        }
    }

    #[test]
    fn creation_fields_fill_all_four_columns() {
        let fields = stamp().creation_fields();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields.get(CREATED), Some("2026-03-01T09:30:00Z"));
        assert_eq!(fields.get(LAST_MODIFIED_BY), Some("amira"));
    }

    #[test]
    fn modification_fields_leave_creation_alone() {
        let fields = stamp().modification_fields();
        assert!(!fields.contains(CREATED));
        assert_eq!(fields.get(LAST_MODIFIED), Some("2026-03-01T09:30:00Z"));
    }

    #[test]
    fn audit_columns_match_case_insensitively() {
        assert!(is_audit_column("Created_By"));
        assert!(!is_audit_column("name"));
    }
}
