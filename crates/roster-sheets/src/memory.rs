//! In-process [`SheetStore`] with an operation journal.
//!
//! Used by the `memory` backend and as the gateway double in tests. Reads
//! trim trailing empty cells and rows the same way the Google backend does.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::SheetsError;
use crate::store::SheetStore;

/// Kind of gateway call, used to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListTables,
    CreateTable,
    ReadRange,
    UpdateRow,
    AppendRow,
    FreezeRows,
}

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListTables,
    CreateTable(String),
    ReadRange {
        table: String,
        first_row: u32,
        last_row: Option<u32>,
    },
    UpdateRow {
        table: String,
        row: u32,
        values: Vec<String>,
    },
    AppendRow {
        table: String,
        values: Vec<String>,
    },
    FreezeRows {
        table: String,
        count: u32,
    },
}

impl StoreCall {
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::ListTables => Operation::ListTables,
            Self::CreateTable(_) => Operation::CreateTable,
            Self::ReadRange { .. } => Operation::ReadRange,
            Self::UpdateRow { .. } => Operation::UpdateRow,
            Self::AppendRow { .. } => Operation::AppendRow,
            Self::FreezeRows { .. } => Operation::FreezeRows,
        }
    }
}

#[derive(Debug, Default)]
struct MemTable {
    name: String,
    /// `rows[i]` is sheet row `i + 1`.
    rows: Vec<Vec<String>>,
    frozen: u32,
}

#[derive(Debug, Default)]
struct State {
    tables: Vec<MemTable>,
    journal: Vec<StoreCall>,
    failing: HashSet<Operation>,
}

impl State {
    fn table(&self, name: &str) -> Result<&MemTable, SheetsError> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| SheetsError::NotFound(format!("table '{name}'")))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MemTable, SheetsError> {
        self.tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| SheetsError::NotFound(format!("table '{name}'")))
    }

    /// Record `call`, then fail it if its operation is marked failing.
    fn record(&mut self, call: StoreCall) -> Result<(), SheetsError> {
        let op = call.operation();
        self.journal.push(call);
        if self.failing.contains(&op) {
            return Err(SheetsError::Api {
                status: 503,
                message: format!("injected {op:?} failure"),
            });
        }
        Ok(())
    }
}

/// In-memory spreadsheet document.
#[derive(Debug, Default)]
pub struct MemorySheets {
    state: Mutex<State>,
}

impl MemorySheets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with raw rows, starting at sheet row 1.
    #[must_use]
    pub fn with_table<R, C>(self, name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        {
            let mut state = self.lock();
            state.tables.retain(|t| t.name != name);
            state.tables.push(MemTable {
                name: name.to_string(),
                rows: rows
                    .into_iter()
                    .map(|row| row.into_iter().map(Into::into).collect())
                    .collect(),
                frozen: 0,
            });
        }
        self
    }

    /// Every call made so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().journal.clone()
    }

    /// Recorded calls that change the document.
    #[must_use]
    pub fn writes(&self) -> Vec<StoreCall> {
        self.lock()
            .journal
            .iter()
            .filter(|c| {
                !matches!(
                    c.operation(),
                    Operation::ListTables | Operation::ReadRange
                )
            })
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().journal.clear();
    }

    /// Make every subsequent call of `op` fail until [`Self::recover`].
    pub fn fail_on(&self, op: Operation) {
        self.lock().failing.insert(op);
    }

    pub fn recover(&self) {
        self.lock().failing.clear();
    }

    /// Raw rows of a table, or `None` if it does not exist.
    #[must_use]
    pub fn snapshot(&self, table: &str) -> Option<Vec<Vec<String>>> {
        self.lock().table(table).ok().map(|t| t.rows.clone())
    }

    #[must_use]
    pub fn frozen_rows(&self, table: &str) -> Option<u32> {
        self.lock().table(table).ok().map(|t| t.frozen)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn trimmed(row: &[String]) -> Vec<String> {
    let len = row.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
    row[..len].to_vec()
}

fn row_index(row: u32) -> usize {
    usize::try_from(row.saturating_sub(1)).unwrap_or(usize::MAX)
}

#[async_trait]
impl SheetStore for MemorySheets {
    async fn list_tables(&self) -> Result<Vec<String>, SheetsError> {
        let mut state = self.lock();
        state.record(StoreCall::ListTables)?;
        Ok(state.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn create_table(&self, name: &str) -> Result<(), SheetsError> {
        let mut state = self.lock();
        state.record(StoreCall::CreateTable(name.to_string()))?;
        if state
            .tables
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(name))
        {
            return Err(SheetsError::AlreadyExists(name.to_string()));
        }
        state.tables.push(MemTable {
            name: name.to_string(),
            ..MemTable::default()
        });
        Ok(())
    }

    async fn read_range(
        &self,
        table: &str,
        first_row: u32,
        last_row: Option<u32>,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let mut state = self.lock();
        state.record(StoreCall::ReadRange {
            table: table.to_string(),
            first_row,
            last_row,
        })?;
        let rows = &state.table(table)?.rows;
        let start = row_index(first_row).min(rows.len());
        let end = last_row.map_or(rows.len(), |last| {
            usize::try_from(last).unwrap_or(usize::MAX).min(rows.len())
        });
        let mut out: Vec<Vec<String>> = rows
            .get(start..end.max(start))
            .unwrap_or_default()
            .iter()
            .map(|r| trimmed(r))
            .collect();
        while out.last().is_some_and(Vec::is_empty) {
            out.pop();
        }
        Ok(out)
    }

    async fn update_row(
        &self,
        table: &str,
        row: u32,
        values: &[String],
    ) -> Result<(), SheetsError> {
        let mut state = self.lock();
        state.record(StoreCall::UpdateRow {
            table: table.to_string(),
            row,
            values: values.to_vec(),
        })?;
        let rows = &mut state.table_mut(table)?.rows;
        let idx = row_index(row);
        if rows.len() <= idx {
            rows.resize_with(idx + 1, Vec::new);
        }
        let target = &mut rows[idx];
        if target.len() < values.len() {
            target.resize(values.len(), String::new());
        }
        target[..values.len()].clone_from_slice(values);
        Ok(())
    }

    async fn append_row(
        &self,
        table: &str,
        from_row: u32,
        values: &[String],
    ) -> Result<(), SheetsError> {
        let mut state = self.lock();
        state.record(StoreCall::AppendRow {
            table: table.to_string(),
            values: values.to_vec(),
        })?;
        let rows = &mut state.table_mut(table)?.rows;
        let after_last = rows
            .iter()
            .rposition(|r| r.iter().any(|c| !c.is_empty()))
            .map_or(0, |i| i + 1);
        let idx = after_last.max(row_index(from_row));
        if rows.len() <= idx {
            rows.resize_with(idx + 1, Vec::new);
        }
        rows[idx] = values.to_vec();
        Ok(())
    }

    async fn freeze_rows(&self, table: &str, count: u32) -> Result<(), SheetsError> {
        let mut state = self.lock();
        state.record(StoreCall::FreezeRows {
            table: table.to_string(),
            count,
        })?;
        state.table_mut(table)?.frozen = count;
        Ok(())
    }
}
