//! Submitted field maps.

use serde::{Deserialize, Serialize};

/// One submitted `name: value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// An ordered field map with case-insensitive names.
///
/// Insertion order is preserved because it decides the order in which unknown
/// columns are negotiated. Re-inserting a name (in any casing) replaces the
/// value in place and keeps the first spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.fields[idx].value = value,
            None => self.fields.push(Field { name, value }),
        }
    }

    /// Value for `name`, compared case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.fields[idx].value.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|idx| self.fields.remove(idx).value)
    }

    /// Field names in submission order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Lay the record out in `columns` order. Columns without a field become
    /// empty strings; fields without a column are left out.
    #[must_use]
    pub fn to_row(&self, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|column| self.get(column).unwrap_or_default().to_string())
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| crate::same_name(&f.name, name))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}
