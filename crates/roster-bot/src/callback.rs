//! Inline keyboard callback payloads.
//!
//! Telegram limits callback data to 64 bytes, so table names that would not
//! fit get no menu button.

use std::fmt;

/// Largest callback payload Telegram accepts, in bytes.
pub const MAX_CALLBACK_DATA: usize = 64;

const TABLE_PREFIX: &str = "tbl:";
const NEW_TABLE: &str = "new";
const ACCEPT_PREFIX: &str = "neg:a:";
const DECLINE_PREFIX: &str = "neg:d:";
const RETRY: &str = "retry";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Open the named table.
    SelectTable(String),
    /// Ask for the name of a table to create.
    NewTable,
    /// Answer the column question asked at `step`.
    Decide { step: u32, accept: bool },
    /// Retry a commit that failed.
    Retry,
}

impl CallbackAction {
    /// A table button, or `None` if the name is too long for callback data.
    #[must_use]
    pub fn select_table(name: &str) -> Option<Self> {
        (TABLE_PREFIX.len() + name.len() <= MAX_CALLBACK_DATA)
            .then(|| Self::SelectTable(name.to_string()))
    }

    /// Decode callback data. Unknown payloads yield `None`.
    #[must_use]
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(name) = data.strip_prefix(TABLE_PREFIX) {
            return (!name.is_empty()).then(|| Self::SelectTable(name.to_string()));
        }
        if let Some(step) = data.strip_prefix(ACCEPT_PREFIX) {
            return step.parse().ok().map(|step| Self::Decide { step, accept: true });
        }
        if let Some(step) = data.strip_prefix(DECLINE_PREFIX) {
            return step.parse().ok().map(|step| Self::Decide { step, accept: false });
        }
        match data {
            NEW_TABLE => Some(Self::NewTable),
            RETRY => Some(Self::Retry),
            _ => None,
        }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectTable(name) => write!(f, "{TABLE_PREFIX}{name}"),
            Self::NewTable => f.write_str(NEW_TABLE),
            Self::Decide { step, accept: true } => write!(f, "{ACCEPT_PREFIX}{step}"),
            Self::Decide {
                step,
                accept: false,
            } => write!(f, "{DECLINE_PREFIX}{step}"),
            Self::Retry => f.write_str(RETRY),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("tbl:Students", CallbackAction::SelectTable("Students".into()))]
    #[case("tbl:a:b", CallbackAction::SelectTable("a:b".into()))]
    #[case("new", CallbackAction::NewTable)]
    #[case("neg:a:0", CallbackAction::Decide { step: 0, accept: true })]
    #[case("neg:d:12", CallbackAction::Decide { step: 12, accept: false })]
    #[case("retry", CallbackAction::Retry)]
    fn known_payloads_decode(#[case] data: &str, #[case] expected: CallbackAction) {
        assert_eq!(CallbackAction::parse(data), Some(expected.clone()));
        assert_eq!(expected.encode(), data);
    }

    #[rstest]
    #[case("")]
    #[case("tbl:")]
    #[case("neg:a:")]
    #[case("neg:x:1")]
    #[case("neg:d:-1")]
    #[case("select_sheet:Students")]
    fn unknown_payloads_are_ignored(#[case] data: &str) {
        assert_eq!(CallbackAction::parse(data), None);
    }

    #[test]
    fn long_table_names_get_no_button() {
        let fits = "x".repeat(MAX_CALLBACK_DATA - TABLE_PREFIX.len());
        assert!(CallbackAction::select_table(&fits).is_some());
        assert!(CallbackAction::select_table(&format!("{fits}x")).is_none());
    }

    #[test]
    fn decision_payloads_fit_for_any_step() {
        let data = CallbackAction::Decide {
            step: u32::MAX,
            accept: false,
        }
        .encode();
        assert!(data.len() <= MAX_CALLBACK_DATA);
    }
}
