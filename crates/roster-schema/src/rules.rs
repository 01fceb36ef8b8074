//! Per-column validation rules read from the rule row.

use std::sync::Arc;

use regex::Regex;
use roster_core::a1::RangeRef;
use roster_core::audit::is_audit_column;
use roster_core::record::Record;
use roster_core::rule::{ListSource, Rule, RuleKind};
use roster_core::{DATA_START_ROW, HEADER_ROW, RULE_ROW, same_name};
use roster_sheets::SheetStore;

use crate::error::SchemaError;

/// Outcome of checking one value against its column's rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    /// Why the value was rejected. `None` when valid.
    pub message: Option<String>,
}

impl Verdict {
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// A rejected field of a submitted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub column: String,
    pub value: String,
    pub message: String,
}

/// Header and rule row of one table, read together.
#[derive(Debug, Clone, Default)]
pub struct RuleRow {
    table: String,
    header: Vec<String>,
    cells: Vec<String>,
}

impl RuleRow {
    /// Rule of `column`. A missing or blank cell means no rule.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidRule`] if the cell is not a recognised directive.
    pub fn rule(&self, column: &str) -> Result<Option<Rule>, SchemaError> {
        let Some(pos) = self.header.iter().position(|h| same_name(h, column)) else {
            return Ok(None);
        };
        let cell = self.cells.get(pos).map_or("", String::as_str);
        Rule::parse(cell).map_err(|source| SchemaError::InvalidRule {
            table: self.table.clone(),
            column: column.to_string(),
            source,
        })
    }
}

/// Evaluates candidate values against the rule row.
pub struct RuleResolver {
    store: Arc<dyn SheetStore>,
}

impl RuleResolver {
    #[must_use]
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        Self { store }
    }

    /// Read the header and rule rows of `table` in one call.
    pub async fn load(&self, table: &str) -> Result<RuleRow, SchemaError> {
        let mut rows = self
            .store
            .read_range(table, HEADER_ROW, Some(RULE_ROW))
            .await
            .map_err(|e| SchemaError::from_gateway(table, e))?
            .into_iter();
        Ok(RuleRow {
            table: table.to_string(),
            header: rows.next().unwrap_or_default(),
            cells: rows.next().unwrap_or_default(),
        })
    }

    /// Rule of `column` in `table`, if any.
    pub async fn get_rule(&self, table: &str, column: &str) -> Result<Option<Rule>, SchemaError> {
        self.load(table).await?.rule(column)
    }

    /// Check `value` against the rule of `column`.
    ///
    /// Rules that cannot be evaluated (unknown directive, bad pattern,
    /// unreadable list source) are logged and let the value through.
    pub async fn validate(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Verdict, SchemaError> {
        let rules = self.load(table).await?;
        Ok(self.check(&rules, column, value).await)
    }

    /// Validate every field of `record` whose column already has a rule.
    /// Audit columns are skipped.
    pub async fn validate_record(
        &self,
        table: &str,
        record: &Record,
    ) -> Result<Vec<FieldFailure>, SchemaError> {
        let rules = self.load(table).await?;
        let mut failures = Vec::new();
        for field in record.iter() {
            if is_audit_column(&field.name) {
                continue;
            }
            let verdict = self.check(&rules, &field.name, &field.value).await;
            if let Some(message) = verdict.message.filter(|_| !verdict.valid) {
                failures.push(FieldFailure {
                    column: field.name.clone(),
                    value: field.value.clone(),
                    message,
                });
            }
        }
        Ok(failures)
    }

    /// Write the rule row of `table`. Columns without an entry get a blank
    /// cell.
    pub async fn write_rules(&self, table: &str, rules: &[(&str, Rule)]) -> Result<(), SchemaError> {
        let header = self
            .store
            .read_header(table)
            .await
            .map_err(|e| SchemaError::from_gateway(table, e))?;
        let mut cells = vec![String::new(); header.len()];
        for (column, rule) in rules {
            let pos = header
                .iter()
                .position(|h| same_name(h, column))
                .ok_or_else(|| SchemaError::ColumnNotFound {
                    table: table.to_string(),
                    column: (*column).to_string(),
                })?;
            cells[pos] = rule.to_string();
        }
        self.store
            .update_row(table, RULE_ROW, &cells)
            .await
            .map_err(|e| SchemaError::from_gateway(table, e))
    }

    async fn check(&self, rules: &RuleRow, column: &str, value: &str) -> Verdict {
        let rule = match rules.rule(column) {
            Ok(Some(rule)) => rule,
            Ok(None) => return Verdict::pass(),
            Err(e) => {
                tracing::warn!(table = %rules.table, column, %e, "ignoring unreadable rule");
                return Verdict::pass();
            }
        };
        match rule.kind {
            RuleKind::Regex => check_pattern(&rules.table, column, &rule.parameter, value),
            RuleKind::List => self.check_list(&rules.table, column, &rule, value).await,
        }
    }

    async fn check_list(&self, table: &str, column: &str, rule: &Rule, value: &str) -> Verdict {
        let allowed = match rule.list_source() {
            Ok(ListSource::Literal(values)) => values,
            Ok(ListSource::Range(range)) => match self.range_values(&range).await {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(table, column, source = %rule.parameter, %e, "list source unavailable, accepting value");
                    return Verdict::pass();
                }
            },
            Err(e) => {
                tracing::warn!(table, column, %e, "ignoring malformed list source");
                return Verdict::pass();
            }
        };
        if allowed.iter().any(|a| a == value) {
            Verdict::pass()
        } else {
            Verdict::fail(format!(
                "'{value}' is not allowed for {column}. Allowed values: {}",
                allowed.join(", ")
            ))
        }
    }

    /// Non-blank cells of `range`. Without explicit row bounds the header
    /// and rule rows of the source table are skipped.
    async fn range_values(&self, range: &RangeRef) -> Result<Vec<String>, SchemaError> {
        let first_row = range.start.row.unwrap_or(DATA_START_ROW);
        let rows = self
            .store
            .read_range(&range.table, first_row, range.end.row)
            .await
            .map_err(|e| SchemaError::from_gateway(&range.table, e))?;
        Ok(rows
            .into_iter()
            .flat_map(|row| {
                row.into_iter()
                    .enumerate()
                    .filter(|(col, _)| range.covers_column(*col))
                    .map(|(_, cell)| cell)
            })
            .filter(|cell| !cell.is_empty())
            .collect())
    }
}

fn check_pattern(table: &str, column: &str, pattern: &str, value: &str) -> Verdict {
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) if re.is_match(value) => Verdict::pass(),
        Ok(_) => Verdict::fail(format!(
            "'{value}' is not valid for {column}. It must match the pattern {pattern}"
        )),
        Err(e) => {
            tracing::warn!(table, column, pattern, %e, "ignoring invalid pattern");
            Verdict::pass()
        }
    }
}
