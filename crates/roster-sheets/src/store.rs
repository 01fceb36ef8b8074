//! The spreadsheet gateway trait.

use async_trait::async_trait;
use roster_core::HEADER_ROW;

use crate::error::SheetsError;

/// A spreadsheet document holding named tables of text cells.
///
/// Row indexes are 1-based sheet rows. Values are written verbatim; callers
/// pad rows into column order before writing.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Titles of every table in the document.
    async fn list_tables(&self) -> Result<Vec<String>, SheetsError>;

    /// Add an empty table.
    ///
    /// Fails with [`SheetsError::AlreadyExists`] if the title is taken.
    async fn create_table(&self, name: &str) -> Result<(), SheetsError>;

    /// Rows `first_row..=last_row` (open-ended when `last_row` is `None`).
    ///
    /// Element `i` of the result is sheet row `first_row + i`. Trailing empty
    /// rows are omitted and trailing empty cells of a row may be omitted.
    /// Fails with [`SheetsError::NotFound`] for an unknown table.
    async fn read_range(
        &self,
        table: &str,
        first_row: u32,
        last_row: Option<u32>,
    ) -> Result<Vec<Vec<String>>, SheetsError>;

    /// Overwrite a row starting at column `A`, in a single write.
    async fn update_row(&self, table: &str, row: u32, values: &[String])
    -> Result<(), SheetsError>;

    /// Append a row after the last populated row at or below `from_row`.
    async fn append_row(
        &self,
        table: &str,
        from_row: u32,
        values: &[String],
    ) -> Result<(), SheetsError>;

    /// Freeze the first `count` rows of a table.
    async fn freeze_rows(&self, table: &str, count: u32) -> Result<(), SheetsError>;

    /// Header row of a table; empty when the table has no header yet.
    async fn read_header(&self, table: &str) -> Result<Vec<String>, SheetsError> {
        let rows = self
            .read_range(table, HEADER_ROW, Some(HEADER_ROW))
            .await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    /// Replace the header row.
    async fn write_header(&self, table: &str, columns: &[String]) -> Result<(), SheetsError> {
        self.update_row(table, HEADER_ROW, columns).await
    }

    /// Every row from `from_row` on. An absent table reads as empty.
    async fn read_rows(&self, table: &str, from_row: u32) -> Result<Vec<Vec<String>>, SheetsError> {
        match self.read_range(table, from_row, None).await {
            Err(SheetsError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }
}
