//! A1-notation helpers.
//!
//! Column letters are bijective base-26 (`A`..`Z`, `AA`..`ZZ`, `AAA`..), so
//! tables are not limited to 26 columns. Sheet titles are always quoted,
//! which keeps titles with spaces or punctuation addressable.

use crate::errors::CoreError;

/// Convert a 0-based column index into its letter form (`0` → `A`, `26` → `AA`).
#[must_use]
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        // rem < 26, always a valid ASCII offset
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Convert column letters into a 0-based index (`A` → `0`). Case-insensitive.
#[must_use]
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut n: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}

/// Quote a sheet title for use in a range: `My Sheet` → `'My Sheet'`.
#[must_use]
pub fn quote_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Address of the first cell of a 1-based row: `'T'!A3`.
#[must_use]
pub fn row_start(title: &str, row: u32) -> String {
    format!("{}!A{row}", quote_sheet(title))
}

/// The first `width` cells of a 1-based row: `'T'!A1:AB1`. A zero width
/// addresses the row's first cell.
#[must_use]
pub fn row_span(title: &str, row: u32, width: usize) -> String {
    match width.checked_sub(1) {
        Some(last) => format!("{}:{}{row}", row_start(title, row), column_letter(last)),
        None => row_start(title, row),
    }
}

/// Open-ended range from a 1-based row to the last populated row: `'T'!A3:ZZ`.
#[must_use]
pub fn rows_from(title: &str, row: u32) -> String {
    format!("{}!A{row}:ZZ", quote_sheet(title))
}

/// One end of a range reference: a column and an optional 1-based row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub column: usize,
    pub row: Option<u32>,
}

impl CellRef {
    fn parse(text: &str) -> Option<Self> {
        let split = text
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(text.len());
        let (letters, digits) = text.split_at(split);
        let column = column_index(letters)?;
        let row = if digits.is_empty() {
            None
        } else {
            Some(digits.parse::<u32>().ok().filter(|r| *r > 0)?)
        };
        Some(Self { column, row })
    }
}

/// A reference to a rectangular range of another table, e.g. `Students!A:A`
/// or `'Class list'!B2:B40`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRef {
    pub table: String,
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    /// Parse a `Table!Start[:End]` reference.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRange`] if the table part is missing or
    /// either cell reference is malformed.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidRange(text.to_string());
        let (table, range) = text.trim().rsplit_once('!').ok_or_else(invalid)?;
        let table = unquote_sheet(table.trim());
        if table.is_empty() {
            return Err(invalid());
        }
        let (start, end) = match range.split_once(':') {
            Some((start, end)) => (start.trim(), end.trim()),
            None => (range.trim(), range.trim()),
        };
        let start = CellRef::parse(start).ok_or_else(invalid)?;
        let end = CellRef::parse(end).ok_or_else(invalid)?;
        Ok(Self { table, start, end })
    }

    /// Whether a 0-based column index lies inside the range.
    #[must_use]
    pub fn covers_column(&self, column: usize) -> bool {
        let (lo, hi) = ordered(self.start.column, self.end.column);
        (lo..=hi).contains(&column)
    }

    /// Whether a 1-based row index lies inside the range. Open bounds match.
    #[must_use]
    pub fn covers_row(&self, row: u32) -> bool {
        self.start.row.is_none_or(|lo| row >= lo) && self.end.row.is_none_or(|hi| row <= hi)
    }

    /// Lowest 0-based column index in the range.
    #[must_use]
    pub fn first_column(&self) -> usize {
        self.start.column.min(self.end.column)
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

fn unquote_sheet(title: &str) -> String {
    title
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .map_or_else(|| title.to_string(), |t| t.replace("''", "'"))
}
