//! The record intake state machine.
//!
//! One machine serves both entry styles. Free-form text is parsed into a
//! record; step-by-step entry fills the same kind of record one column at a
//! time. Either way the finished record is diffed against the table's
//! columns and goes through [`Intake::settle`]: a record whose fields all
//! have columns is appended straight away, anything else opens a column
//! negotiation.

use std::sync::Arc;

use roster_core::DATA_START_ROW;
use roster_core::audit::{AuditStamp, is_audit_column};
use roster_core::record::Record;
use roster_core::row::RowMap;
use roster_core::rule::Rule;
use roster_schema::{RuleResolver, SchemaCatalog, SchemaError, Table, TableTemplate};
use roster_search::{SearchEngine, SearchMode};
use roster_sheets::SheetStore;

use crate::error::IntakeError;
use crate::parse::parse_fields;
use crate::session::{FieldCursor, IntakeState, PendingNegotiation, Session};

/// Longest accepted table name.
pub const MAX_TABLE_NAME_LEN: usize = 100;

/// What the conversation should show next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A table was opened (and possibly created) and is now selected.
    TableSelected {
        table: String,
        created: bool,
        columns: Vec<String>,
    },
    /// Ask for the name of a table to create.
    AskTableName,
    /// Ask whether `column` should be added to the table.
    AskColumn {
        table: String,
        column: String,
        value: String,
        step: u32,
        remaining: usize,
    },
    /// Ask for the value of one column.
    AskField {
        table: String,
        column: String,
        position: usize,
        total: usize,
        rule: Option<Rule>,
        /// Why the previous answer for this column was rejected.
        error: Option<String>,
    },
    /// A row was appended. `record` holds the non-empty values written.
    Committed { table: String, record: Record },
    /// An existing row was overwritten.
    Updated {
        table: String,
        row: u32,
        record: Record,
    },
    /// The conversation went back to its resting state.
    Cancelled { discarded: bool },
}

/// Drives record intake for every conversation.
///
/// Holds no per-conversation state; callers pass the conversation's
/// [`Session`] into each operation.
pub struct Intake {
    catalog: Arc<SchemaCatalog>,
    rules: RuleResolver,
    search: SearchEngine,
}

impl Intake {
    #[must_use]
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        let catalog = Arc::new(SchemaCatalog::new(store.clone()));
        Self {
            rules: RuleResolver::new(store),
            search: SearchEngine::new(catalog.clone()),
            catalog,
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    /// Route a plain text message according to the session state.
    pub async fn handle_text(
        &self,
        session: &mut Session,
        text: &str,
        stamp: &AuditStamp,
    ) -> Result<Outcome, IntakeError> {
        match session.state {
            IntakeState::AwaitingTableName => self.select_or_create_table(session, text).await,
            IntakeState::AwaitingFieldValue(_) => {
                self.submit_field_value(session, text, stamp).await
            }
            _ => self.submit_record(session, text, stamp).await,
        }
    }

    /// Open the table called `name`, creating it if no table matches.
    ///
    /// An exact title match wins over a case-insensitive one. New tables get
    /// their top two rows frozen; failing to freeze them is only logged.
    pub async fn select_or_create_table(
        &self,
        session: &mut Session,
        name: &str,
    ) -> Result<Outcome, IntakeError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_TABLE_NAME_LEN || name.contains('\n') {
            return Err(IntakeError::InvalidTableName(name.to_string()));
        }

        let tables = self.catalog.list_tables().await?;
        let existing = tables
            .iter()
            .find(|t| t.as_str() == name)
            .or_else(|| tables.iter().find(|t| roster_core::same_name(t, name)));
        let (table, created) = match existing {
            Some(title) => (title.clone(), false),
            None => {
                self.catalog.create_table(name).await?;
                if let Err(e) = self
                    .catalog
                    .store()
                    .freeze_rows(name, roster_core::FROZEN_ROWS)
                    .await
                {
                    tracing::warn!(table = name, %e, "could not freeze header rows");
                }
                tracing::info!(table = name, "created table");
                (name.to_string(), true)
            }
        };
        self.enter_table(session, table, created).await
    }

    /// Provision a built-in table if needed and select it. An existing table
    /// whose title differs only in case is selected under its own title.
    pub async fn open_template(
        &self,
        session: &mut Session,
        template: &TableTemplate,
    ) -> Result<Outcome, IntakeError> {
        let provisioned = roster_schema::ensure_template(&self.catalog, template).await?;
        self.enter_table(session, provisioned.table, provisioned.created)
            .await
    }

    /// Wait for the name of a new table.
    pub fn begin_table_creation(&self, session: &mut Session) -> Outcome {
        session.state = IntakeState::AwaitingTableName;
        Outcome::AskTableName
    }

    /// Submit free-form `name: value` lines to the selected table.
    ///
    /// Values for columns the table already has are validated first; if any
    /// fails, nothing is stored and every failure is reported. Audit columns
    /// the table has are filled from `stamp`.
    pub async fn submit_record(
        &self,
        session: &mut Session,
        text: &str,
        stamp: &AuditStamp,
    ) -> Result<Outcome, IntakeError> {
        if let Some(open) = session.negotiation() {
            return Err(IntakeError::NegotiationInProgress {
                table: open.table.clone(),
                pending: open.pending.clone(),
            });
        }
        let table = session.table.clone().ok_or(IntakeError::NoTableSelected)?;
        let record = parse_fields(text)?;

        let failures = self.rules.validate_record(&table, &record).await?;
        if !failures.is_empty() {
            return Err(IntakeError::ValidationFailed(failures));
        }

        self.settle(session, table, record, stamp).await
    }

    /// Answer the column question asked at `step`.
    ///
    /// Accepting adds the column to the table; declining drops the field from
    /// this record. Once no column is pending the record is committed. If the
    /// commit fails the negotiation stays open and [`Self::resume_commit`]
    /// retries it.
    pub async fn submit_column_decision(
        &self,
        session: &mut Session,
        step: u32,
        accept: bool,
    ) -> Result<Outcome, IntakeError> {
        let IntakeState::NegotiatingColumn(negotiation) = &mut session.state else {
            return Err(IntakeError::NoNegotiation);
        };
        if step != negotiation.step {
            return Err(IntakeError::StaleDecision);
        }
        let Some(column) = negotiation.current().map(String::from) else {
            return Err(IntakeError::StaleDecision);
        };

        if accept {
            self.catalog.add_column(&negotiation.table, &column).await?;
        } else {
            negotiation.record.remove(&column);
        }
        negotiation.pending.remove(0);
        negotiation.step = issue_step(&mut session.next_step);
        tracing::info!(
            table = %negotiation.table,
            column = %column,
            accept,
            remaining = negotiation.pending.len(),
            "column decision"
        );

        if !negotiation.pending.is_empty() {
            return Ok(ask_column(negotiation));
        }
        self.finish_negotiation(session).await
    }

    /// Retry after a failed commit, or repeat the current question.
    pub async fn resume_commit(
        &self,
        session: &mut Session,
        stamp: &AuditStamp,
    ) -> Result<Outcome, IntakeError> {
        let negotiating = match &session.state {
            IntakeState::NegotiatingColumn(negotiation) => match negotiation.current() {
                Some(_) => return Ok(ask_column(negotiation)),
                None => true,
            },
            IntakeState::AwaitingFieldValue(cursor) => {
                if !cursor.is_complete() {
                    return Ok(self.prompt_field(cursor, None).await);
                }
                false
            }
            _ => return Err(IntakeError::NoNegotiation),
        };
        if negotiating {
            self.finish_negotiation(session).await
        } else {
            self.finish_guided(session, stamp).await
        }
    }

    /// Start step-by-step entry over the selected table's columns.
    pub async fn begin_guided(&self, session: &mut Session) -> Result<Outcome, IntakeError> {
        let table = session.table.clone().ok_or(IntakeError::NoTableSelected)?;
        let model = self.catalog.refresh(&table).await?;
        let columns: Vec<String> = model
            .named_columns()
            .filter(|c| !is_audit_column(c))
            .map(String::from)
            .collect();
        if columns.is_empty() {
            session.state = IntakeState::AwaitingFreeForm;
            return Err(IntakeError::NoColumns(table));
        }

        let cursor = FieldCursor {
            table,
            columns,
            position: 0,
            record: Record::new(),
        };
        let outcome = self.prompt_field(&cursor, None).await;
        session.state = IntakeState::AwaitingFieldValue(cursor);
        Ok(outcome)
    }

    /// Supply the value of the column the cursor points at.
    ///
    /// A rejected value re-prompts the same column with the rule's message.
    /// After the last column the record is settled like a free-form one.
    pub async fn submit_field_value(
        &self,
        session: &mut Session,
        text: &str,
        stamp: &AuditStamp,
    ) -> Result<Outcome, IntakeError> {
        let IntakeState::AwaitingFieldValue(cursor) = &mut session.state else {
            return Err(IntakeError::NotAwaitingValue);
        };
        let Some(column) = cursor.current().map(String::from) else {
            return self.finish_guided(session, stamp).await;
        };

        let value = text.trim();
        if value.is_empty() {
            return Ok(self
                .prompt_field(cursor, Some("Please send a value.".to_string()))
                .await);
        }
        let verdict = self.rules.validate(&cursor.table, &column, value).await?;
        if !verdict.valid {
            tracing::debug!(table = %cursor.table, column = %column, "value rejected");
            return Ok(self.prompt_field(cursor, verdict.message).await);
        }

        cursor.record.insert(column, value);
        cursor.position += 1;
        if !cursor.is_complete() {
            return Ok(self.prompt_field(cursor, None).await);
        }
        self.finish_guided(session, stamp).await
    }

    /// Drop any open negotiation or entry and return to the resting state.
    pub fn cancel(&self, session: &mut Session) -> Outcome {
        let discarded = matches!(
            session.state,
            IntakeState::NegotiatingColumn(_)
                | IntakeState::AwaitingFieldValue(_)
                | IntakeState::AwaitingTableName
        );
        if discarded {
            tracing::debug!(state = %session.state, "discarding conversation state");
        }
        session.state = session.resting_state();
        Outcome::Cancelled { discarded }
    }

    /// Overwrite fields of the first row whose `column` equals `value`.
    ///
    /// Only columns the table already has may be changed. The row's
    /// modification audit columns are refreshed from `stamp`.
    pub async fn update_record(
        &self,
        session: &mut Session,
        column: &str,
        value: &str,
        text: &str,
        stamp: &AuditStamp,
    ) -> Result<Outcome, IntakeError> {
        let table = session.table.clone().ok_or(IntakeError::NoTableSelected)?;
        let mut changes = parse_fields(text)?;
        let model = self.catalog.table(&table).await?;
        if let Some(unknown) = changes.names().find(|n| !model.has_column(n)) {
            return Err(SchemaError::ColumnNotFound {
                table,
                column: unknown.to_string(),
            }
            .into());
        }
        let failures = self.rules.validate_record(&table, &changes).await?;
        if !failures.is_empty() {
            return Err(IntakeError::ValidationFailed(failures));
        }

        let found = self
            .search
            .locate_first(&table, column, value, SearchMode::Exact)
            .await?
            .ok_or_else(|| IntakeError::NoMatch {
                table: table.clone(),
                column: column.to_string(),
                value: value.to_string(),
            })?;

        stamp_audit(&model, &mut changes, &stamp.modification_fields());
        let mut values: Vec<String> = found
            .cells
            .iter()
            .map(|(_, v)| v.clone().unwrap_or_default())
            .collect();
        for field in changes.iter() {
            if let Some(slot) = model.position(&field.name).and_then(|p| values.get_mut(p)) {
                slot.clone_from(&field.value);
            }
        }
        self.catalog
            .store()
            .update_row(&table, found.row, &values)
            .await?;
        tracing::info!(table = %table, row = found.row, fields = changes.len(), "updated row");

        session.state = session.resting_state();
        Ok(Outcome::Updated {
            table,
            row: found.row,
            record: changes,
        })
    }

    /// Rows of `table` whose `column` matches `value`.
    pub async fn search_table(
        &self,
        table: &str,
        column: &str,
        value: &str,
        mode: SearchMode,
    ) -> Result<Vec<RowMap>, IntakeError> {
        Ok(self.search.search(table, column, value, mode).await?)
    }

    /// Rows of `table` ranked by edit distance to `value`.
    pub async fn search_ranked(
        &self,
        table: &str,
        column: &str,
        value: &str,
        max_distance: Option<usize>,
    ) -> Result<Vec<(RowMap, usize)>, IntakeError> {
        Ok(self
            .search
            .search_fuzzy(table, column, value, max_distance)
            .await?)
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, IntakeError> {
        Ok(self.catalog.list_tables().await?)
    }

    /// Named columns of `table`, re-read from the sheet.
    pub async fn list_columns(&self, table: &str) -> Result<Vec<String>, IntakeError> {
        let model = self.catalog.refresh(table).await?;
        Ok(model.named_columns().map(String::from).collect())
    }

    async fn enter_table(
        &self,
        session: &mut Session,
        table: String,
        created: bool,
    ) -> Result<Outcome, IntakeError> {
        let model = self.catalog.refresh(&table).await?;
        let columns = model.named_columns().map(String::from).collect();
        session.table = Some(table.clone());
        session.state = IntakeState::AwaitingFreeForm;
        Ok(Outcome::TableSelected {
            table,
            created,
            columns,
        })
    }

    /// Commit `record` if every field has a column, else open a negotiation
    /// over the missing ones in submission order.
    async fn settle(
        &self,
        session: &mut Session,
        table: String,
        mut record: Record,
        stamp: &AuditStamp,
    ) -> Result<Outcome, IntakeError> {
        let model = self.catalog.table(&table).await?;
        stamp_audit(&model, &mut record, &stamp.creation_fields());
        let pending: Vec<String> = record
            .names()
            .filter(|n| !model.has_column(n))
            .map(String::from)
            .collect();

        if pending.is_empty() {
            let outcome = self.commit(&table, &record).await?;
            session.state = IntakeState::AwaitingFreeForm;
            return Ok(outcome);
        }

        tracing::info!(table = %table, pending = ?pending, "opening column negotiation");
        let negotiation = PendingNegotiation {
            table,
            record,
            pending,
            step: issue_step(&mut session.next_step),
        };
        let outcome = ask_column(&negotiation);
        session.state = IntakeState::NegotiatingColumn(negotiation);
        Ok(outcome)
    }

    async fn finish_negotiation(&self, session: &mut Session) -> Result<Outcome, IntakeError> {
        let IntakeState::NegotiatingColumn(negotiation) = &session.state else {
            return Err(IntakeError::NoNegotiation);
        };
        let outcome = self.commit(&negotiation.table, &negotiation.record).await?;
        session.state = IntakeState::AwaitingFreeForm;
        Ok(outcome)
    }

    async fn finish_guided(
        &self,
        session: &mut Session,
        stamp: &AuditStamp,
    ) -> Result<Outcome, IntakeError> {
        let IntakeState::AwaitingFieldValue(cursor) = &session.state else {
            return Err(IntakeError::NotAwaitingValue);
        };
        let table = cursor.table.clone();
        let record = cursor.record.clone();
        self.settle(session, table, record, stamp).await
    }

    /// Append `record` laid out in the table's column order.
    async fn commit(&self, table: &str, record: &Record) -> Result<Outcome, IntakeError> {
        let columns = self.catalog.columns(table).await?;
        let row = record.to_row(&columns);
        self.catalog
            .store()
            .append_row(table, DATA_START_ROW, &row)
            .await?;
        tracing::info!(table, values = row.len(), "appended row");

        let written = columns
            .into_iter()
            .zip(row)
            .filter(|(_, value)| !value.is_empty())
            .collect();
        Ok(Outcome::Committed {
            table: table.to_string(),
            record: written,
        })
    }

    async fn prompt_field(&self, cursor: &FieldCursor, error: Option<String>) -> Outcome {
        let column = cursor.current().unwrap_or_default().to_string();
        let rule = match self.rules.get_rule(&cursor.table, &column).await {
            Ok(rule) => rule,
            Err(e) => {
                tracing::warn!(table = %cursor.table, column = %column, %e, "could not read rule");
                None
            }
        };
        Outcome::AskField {
            table: cursor.table.clone(),
            column,
            position: cursor.position,
            total: cursor.columns.len(),
            rule,
            error,
        }
    }
}

/// Hand out the next question step of a session.
const fn issue_step(next: &mut u32) -> u32 {
    let step = *next;
    *next = next.wrapping_add(1);
    step
}

fn ask_column(negotiation: &PendingNegotiation) -> Outcome {
    let column = negotiation.current().unwrap_or_default().to_string();
    Outcome::AskColumn {
        table: negotiation.table.clone(),
        value: negotiation
            .record
            .get(&column)
            .unwrap_or_default()
            .to_string(),
        column,
        step: negotiation.step,
        remaining: negotiation.pending.len(),
    }
}

/// Copy the audit fields the table has columns for into `record`. Audit
/// fields the table has no column for are dropped, never negotiated.
fn stamp_audit(model: &Table, record: &mut Record, audit: &Record) {
    for field in audit.iter() {
        if model.has_column(&field.name) {
            record.insert(field.name.clone(), field.value.clone());
        }
    }
    let reserved: Vec<String> = record
        .names()
        .filter(|n| is_audit_column(n) && !model.has_column(n))
        .map(String::from)
        .collect();
    for name in reserved {
        tracing::debug!(column = %name, "ignoring audit field without a column");
        record.remove(&name);
    }
}
