//! Cached column model of one table.

use std::collections::HashMap;

use roster_core::fold_name;

/// A table's header row with a case-insensitive column index.
///
/// Columns are only ever appended. Blank header cells keep their position
/// but are not addressable by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl Table {
    #[must_use]
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(header.len());
        for (pos, column) in header.iter().enumerate() {
            if !column.trim().is_empty() {
                index.entry(fold_name(column)).or_insert(pos);
            }
        }
        Self {
            name: name.into(),
            columns: header,
            index,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header cells in sheet order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Named columns in sheet order, skipping blank header cells.
    pub fn named_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| !c.trim().is_empty())
    }

    /// 0-based position of `column`, compared case-insensitively.
    #[must_use]
    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(&fold_name(column)).copied()
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    /// Append `column` unless a column of that name exists. Returns whether
    /// it was added.
    pub fn push(&mut self, column: &str) -> bool {
        let column = column.trim();
        if column.is_empty() || self.has_column(column) {
            return false;
        }
        self.index.insert(fold_name(column), self.columns.len());
        self.columns.push(column.to_string());
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn positions_are_case_insensitive() {
        let table = Table::new("T", header(&["Name", "Age"]));
        assert_eq!(table.position("name"), Some(0));
        assert_eq!(table.position("AGE"), Some(1));
        assert_eq!(table.position("phone"), None);
    }

    #[test]
    fn blank_header_cells_keep_positions() {
        let table = Table::new("T", header(&["name", "", "age"]));
        assert_eq!(table.position("age"), Some(2));
        assert_eq!(table.named_columns().collect::<Vec<_>>(), vec!["name", "age"]);
    }

    #[test]
    fn push_appends_once() {
        let mut table = Table::new("T", header(&["name"]));
        assert!(table.push("phone"));
        assert!(!table.push("PHONE"));
        assert!(!table.push("  "));
        assert_eq!(table.columns(), header(&["name", "phone"]).as_slice());
    }
}
