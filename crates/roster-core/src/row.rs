//! Stored rows read back as column → value pairs.

use serde::{Deserialize, Serialize};

/// A data row mapped onto the table's current column list.
///
/// Cells are in column order. A row written before later columns were added
/// reads back with `None` for those columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMap {
    /// 1-based sheet row index.
    pub row: u32,
    pub cells: Vec<(String, Option<String>)>,
}

impl RowMap {
    /// Zip raw cell values with `columns`. Missing trailing cells become `None`.
    #[must_use]
    pub fn from_values(row: u32, columns: &[String], values: &[String]) -> Self {
        let cells = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| (column.clone(), values.get(idx).cloned()))
            .collect();
        Self { row, cells }
    }

    /// Value for `column`, compared case-insensitively.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| crate::same_name(name, column))
            .and_then(|(_, value)| value.as_deref())
    }
}
