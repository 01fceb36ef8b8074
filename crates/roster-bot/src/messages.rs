//! Reply texts. Plain text only, so values never need escaping.

use std::fmt::Write;

use roster_core::record::Record;
use roster_core::row::RowMap;
use roster_core::rule::{ListSource, Rule, RuleKind};
use roster_intake::{IntakeError, Outcome};

const RECORD_FORMAT: &str = "name: value\nother column: value";

pub fn welcome(first_name: Option<&str>, has_tables: bool) -> String {
    let greeting = first_name.map_or_else(|| "Hi!".to_string(), |name| format!("Hi {name}!"));
    let prompt = if has_tables {
        "Pick a table to work with or create a new one:"
    } else {
        "The spreadsheet has no tables yet. Create one to get started:"
    };
    format!("{greeting} Welcome to Roster.\n\n{prompt}")
}

pub fn help(commands: &str) -> String {
    format!(
        "Send records one field per line:\n\n{RECORD_FORMAT}\n\n\
         Fields the table does not have yet are offered as new columns.\n\n{commands}"
    )
}

pub fn table_list(tables: &[String]) -> String {
    if tables.is_empty() {
        "No tables yet.".to_string()
    } else {
        "Available tables. Tap one to select it:".to_string()
    }
}

pub fn columns(table: &str, columns: &[String]) -> String {
    if columns.is_empty() {
        return format!("Table \"{table}\" has no columns yet.\nSend some data to create them!");
    }
    let mut out = format!("Columns in \"{table}\":");
    for column in columns {
        let _ = write!(out, "\n• {column}");
    }
    out
}

pub const NO_TABLE: &str = "Please select a table first with /start or /tables.";

pub const SEARCH_USAGE: &str = "Usage: /search <column> <value>";
pub const FUZZY_USAGE: &str = "Usage: /fuzzy <column> <value>";
pub const UPDATE_USAGE: &str = "Usage:\n/update <column> <value>\nname: new value\n...";

pub const NOT_TEXT: &str = "Please send the record as text.";
pub const UNKNOWN_BUTTON: &str = "That button is no longer valid.";

fn record_lines(record: &Record) -> String {
    record
        .iter()
        .map(|f| format!("{}: {}", f.name, f.value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn rule_hint(rule: &Rule) -> String {
    match rule.kind {
        RuleKind::List => match rule.list_source() {
            Ok(ListSource::Literal(values)) => format!("Allowed values: {}", values.join(", ")),
            _ => format!("Allowed values come from {}", rule.parameter),
        },
        RuleKind::Regex => format!("Must match the pattern {}", rule.parameter),
    }
}

pub fn outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::TableSelected {
            table,
            created,
            columns,
        } => {
            let head = if *created {
                format!("Created table \"{table}\".")
            } else {
                format!("Selected table \"{table}\".")
            };
            let known = if columns.is_empty() {
                String::new()
            } else {
                format!("\nColumns: {}", columns.join(", "))
            };
            format!(
                "{head}{known}\n\nSend me data in this format:\n\n{RECORD_FORMAT}\n\n\
                 or use /add to fill it in step by step."
            )
        }
        Outcome::AskTableName => "Send the name of the new table.".to_string(),
        Outcome::AskColumn {
            table,
            column,
            value,
            remaining,
            ..
        } => {
            let more = if *remaining > 1 {
                format!(" ({remaining} new columns to go)")
            } else {
                String::new()
            };
            format!("Found new column \"{column}\" (value: {value}). Add it to \"{table}\"?{more}")
        }
        Outcome::AskField {
            column,
            position,
            total,
            rule,
            error,
            ..
        } => {
            let mut out = String::new();
            if let Some(error) = error {
                let _ = writeln!(out, "❌ {error}");
            }
            let _ = write!(out, "({}/{total}) Send the value for {column}.", position + 1);
            if let Some(rule) = rule {
                let _ = write!(out, "\n{}", rule_hint(rule));
            }
            out
        }
        Outcome::Committed { table, record } => {
            if record.is_empty() {
                format!("✅ Added an empty row to \"{table}\".")
            } else {
                format!("✅ Added to \"{table}\":\n{}", record_lines(record))
            }
        }
        Outcome::Updated { table, row, record } => {
            format!("✅ Updated row {row} of \"{table}\":\n{}", record_lines(record))
        }
        Outcome::Cancelled { discarded: true } => "Cancelled. Nothing was saved.".to_string(),
        Outcome::Cancelled { discarded: false } => "Nothing to cancel.".to_string(),
    }
}

pub fn error(err: &IntakeError) -> String {
    match err {
        IntakeError::ValidationFailed(failures) => {
            let mut out = "❌ Nothing was saved:".to_string();
            for failure in failures {
                let _ = write!(out, "\n• {}", failure.message);
            }
            out
        }
        IntakeError::NoTableSelected => NO_TABLE.to_string(),
        IntakeError::NegotiationInProgress { .. } => {
            format!("❌ {err}. Use the buttons above or /cancel.")
        }
        _ if err.is_user_error() => format!("❌ {err}"),
        _ => "❌ Something went wrong while talking to the spreadsheet. Nothing was saved."
            .to_string(),
    }
}

fn row_line(row: &RowMap) -> String {
    let cells: Vec<String> = row
        .cells
        .iter()
        .filter_map(|(column, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| format!("{column}={v}"))
        })
        .collect();
    format!("row {}: {}", row.row, cells.join(", "))
}

fn truncated_note(out: &mut String, shown: usize, total: usize) {
    if total > shown {
        let _ = write!(out, "\n…and {} more", total - shown);
    }
}

pub fn search_results(
    table: &str,
    column: &str,
    value: &str,
    rows: &[RowMap],
    limit: usize,
) -> String {
    if rows.is_empty() {
        return format!("No rows in \"{table}\" where {column} = {value}.");
    }
    let mut out = format!("{} match(es) in \"{table}\":", rows.len());
    for row in rows.iter().take(limit) {
        let _ = write!(out, "\n{}", row_line(row));
    }
    truncated_note(&mut out, limit.min(rows.len()), rows.len());
    out
}

pub fn ranked_results(
    table: &str,
    column: &str,
    value: &str,
    ranked: &[(RowMap, usize)],
    limit: usize,
) -> String {
    if ranked.is_empty() {
        return format!("Nothing in \"{table}\" is close to {column} = {value}.");
    }
    let mut out = format!("Closest to {column} = {value} in \"{table}\":");
    for (row, distance) in ranked.iter().take(limit) {
        let _ = write!(out, "\n[{distance}] {}", row_line(row));
    }
    truncated_note(&mut out, limit.min(ranked.len()), ranked.len());
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use roster_schema::{FieldFailure, SchemaError};
    use roster_sheets::SheetsError;

    use super::*;

    fn row(n: u32, cells: &[(&str, Option<&str>)]) -> RowMap {
        RowMap {
            row: n,
            cells: cells
                .iter()
                .map(|(c, v)| ((*c).to_string(), v.map(String::from)))
                .collect(),
        }
    }

    #[test]
    fn field_prompt_shows_error_progress_and_rule() {
        let text = outcome(&Outcome::AskField {
            table: "Students".into(),
            column: "status".into(),
            position: 4,
            total: 6,
            rule: Rule::parse("list:active,inactive").unwrap(),
            error: Some("'gone' is not allowed for status".into()),
        });
        assert_eq!(
            text,
            "❌ 'gone' is not allowed for status\n\
             (5/6) Send the value for status.\n\
             Allowed values: active, inactive"
        );
    }

    #[test]
    fn column_question_mentions_remaining() {
        let text = outcome(&Outcome::AskColumn {
            table: "Students".into(),
            column: "phone".into(),
            value: "555".into(),
            step: 0,
            remaining: 2,
        });
        assert_eq!(
            text,
            "Found new column \"phone\" (value: 555). Add it to \"Students\"? (2 new columns to go)"
        );
    }

    #[test]
    fn committed_record_is_echoed() {
        let record: Record = [("name", "Ali"), ("age", "9")].into_iter().collect();
        assert_eq!(
            outcome(&Outcome::Committed {
                table: "Students".into(),
                record,
            }),
            "✅ Added to \"Students\":\nname: Ali\nage: 9"
        );
    }

    #[test]
    fn validation_failures_are_listed() {
        let err = IntakeError::ValidationFailed(vec![
            FieldFailure {
                column: "age".into(),
                value: "x".into(),
                message: "bad age".into(),
            },
            FieldFailure {
                column: "status".into(),
                value: "y".into(),
                message: "bad status".into(),
            },
        ]);
        assert_eq!(error(&err), "❌ Nothing was saved:\n• bad age\n• bad status");
    }

    #[test]
    fn store_failures_are_not_leaked() {
        let err = IntakeError::Sheets(SheetsError::Api {
            status: 500,
            message: "internal token=abc".into(),
        });
        assert!(!error(&err).contains("token"));

        let err = IntakeError::Schema(SchemaError::ColumnNotFound {
            table: "T".into(),
            column: "nick".into(),
        });
        assert_eq!(error(&err), "❌ column 'nick' not found in table 'T'");
    }

    #[test]
    fn search_results_are_truncated_to_the_limit() {
        let rows = vec![
            row(3, &[("name", Some("A")), ("status", Some("active"))]),
            row(5, &[("name", Some("B")), ("status", None)]),
            row(7, &[("name", Some("C")), ("status", Some(""))]),
        ];
        assert_eq!(
            search_results("People", "name", "x", &rows, 2),
            "3 match(es) in \"People\":\nrow 3: name=A, status=active\nrow 5: name=B\n…and 1 more"
        );
        assert_eq!(
            search_results("People", "name", "x", &[], 2),
            "No rows in \"People\" where name = x."
        );
    }

    #[test]
    fn ranked_results_show_distances() {
        let ranked = vec![(row(4, &[("name", Some("Ahmad"))]), 0)];
        assert_eq!(
            ranked_results("People", "name", "Ahmad", &ranked, 10),
            "Closest to name = Ahmad in \"People\":\n[0] row 4: name=Ahmad"
        );
    }

    #[test]
    fn columns_listing() {
        assert_eq!(
            columns("T", &["name".to_string(), "age".to_string()]),
            "Columns in \"T\":\n• name\n• age"
        );
        assert!(columns("T", &[]).contains("no columns yet"));
    }
}
