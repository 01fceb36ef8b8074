//! Free-form `name: value` parsing.

use roster_core::record::Record;

use crate::error::IntakeError;

/// Separates a field name from its value on one line.
pub const FIELD_SEPARATOR: char = ':';

/// Parse one field per line.
///
/// The name is the text before the first separator and the value the text
/// after it, both trimmed. Lines without a separator or with a blank name or
/// value are skipped. A repeated name keeps its first position and its last
/// value.
///
/// # Errors
///
/// [`IntakeError::EmptyRecord`] if no line yields a field.
pub fn parse_fields(text: &str) -> Result<Record, IntakeError> {
    let record: Record = text
        .lines()
        .filter_map(|line| line.split_once(FIELD_SEPARATOR))
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, value)| !name.is_empty() && !value.is_empty())
        .collect();
    if record.is_empty() {
        return Err(IntakeError::EmptyRecord);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn pairs(record: &Record) -> Vec<(&str, &str)> {
        record
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect()
    }

    #[test]
    fn lines_without_separator_are_ignored() {
        let record = parse_fields("name: Ali\nbadline\nage: 9").unwrap();
        assert_eq!(pairs(&record), vec![("name", "Ali"), ("age", "9")]);
    }

    #[test]
    fn only_first_separator_splits() {
        let record = parse_fields("time: 10:30").unwrap();
        assert_eq!(record.get("time"), Some("10:30"));
    }

    #[test]
    fn repeated_names_keep_position_and_last_value() {
        let record = parse_fields("name: Ali\nage: 9\nNAME: Omar").unwrap();
        assert_eq!(pairs(&record), vec![("name", "Omar"), ("age", "9")]);
    }

    #[rstest]
    #[case("")]
    #[case("just some text")]
    #[case(": value without name")]
    #[case("name:   ")]
    #[case("\n\n  \n")]
    fn submissions_without_fields_are_rejected(#[case] text: &str) {
        assert!(matches!(parse_fields(text), Err(IntakeError::EmptyRecord)));
    }

    #[test]
    fn windows_line_endings_are_trimmed() {
        let record = parse_fields("name: Ali\r\nage: 9\r\n").unwrap();
        assert_eq!(pairs(&record), vec![("name", "Ali"), ("age", "9")]);
    }
}
