//! Column scans over a table's data rows.

use std::fmt;
use std::sync::Arc;

use roster_core::DATA_START_ROW;
use roster_core::row::RowMap;
use roster_schema::SchemaCatalog;
use serde::{Deserialize, Serialize};

use crate::distance::{is_fuzzy_match, levenshtein};
use crate::error::SearchError;

/// How a search compares cell values with the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Case-sensitive string equality.
    #[default]
    Exact,
    /// Edit distance within 30% of the longer string.
    Fuzzy,
}

impl SearchMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
        }
    }

    #[must_use]
    pub fn matches(self, query: &str, cell: &str) -> bool {
        match self {
            Self::Exact => query == cell,
            Self::Fuzzy => is_fuzzy_match(query, cell),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data row whose searched cell was compared with the query.
struct Candidate {
    row: u32,
    cell: String,
    values: Vec<String>,
}

/// Read path over the tables of a [`SchemaCatalog`].
pub struct SearchEngine {
    catalog: Arc<SchemaCatalog>,
}

impl SearchEngine {
    #[must_use]
    pub const fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self { catalog }
    }

    /// Rows whose `column` equals `value` exactly, in sheet order.
    pub async fn search_exact(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Vec<RowMap>, SearchError> {
        self.search(table, column, value, SearchMode::Exact).await
    }

    /// Every row ranked by edit distance of `column` to `value`, closest
    /// first. Ties keep sheet order. Rows further than `max_distance` are
    /// dropped when a cutoff is given.
    pub async fn search_fuzzy(
        &self,
        table: &str,
        column: &str,
        value: &str,
        max_distance: Option<usize>,
    ) -> Result<Vec<(RowMap, usize)>, SearchError> {
        let (columns, candidates) = self.scan(table, column).await?;
        let mut ranked: Vec<(RowMap, usize)> = candidates
            .into_iter()
            .map(|c| {
                let distance = levenshtein(value, &c.cell);
                (c, distance)
            })
            .filter(|(_, distance)| max_distance.is_none_or(|max| *distance <= max))
            .map(|(c, distance)| (RowMap::from_values(c.row, &columns, &c.values), distance))
            .collect();
        ranked.sort_by_key(|(_, distance)| *distance);
        tracing::debug!(table, column, results = ranked.len(), "fuzzy search");
        Ok(ranked)
    }

    /// Rows whose `column` matches `value` under `mode`, in sheet order.
    pub async fn search(
        &self,
        table: &str,
        column: &str,
        value: &str,
        mode: SearchMode,
    ) -> Result<Vec<RowMap>, SearchError> {
        let (columns, candidates) = self.scan(table, column).await?;
        let hits: Vec<RowMap> = candidates
            .into_iter()
            .filter(|c| mode.matches(value, &c.cell))
            .map(|c| RowMap::from_values(c.row, &columns, &c.values))
            .collect();
        tracing::debug!(table, column, %mode, results = hits.len(), "search");
        Ok(hits)
    }

    /// The first row whose `column` matches `value` under `mode`.
    pub async fn locate_first(
        &self,
        table: &str,
        column: &str,
        value: &str,
        mode: SearchMode,
    ) -> Result<Option<RowMap>, SearchError> {
        let (columns, candidates) = self.scan(table, column).await?;
        Ok(candidates
            .into_iter()
            .find(|c| mode.matches(value, &c.cell))
            .map(|c| RowMap::from_values(c.row, &columns, &c.values)))
    }

    /// Data rows that reach `column`. Rows too short to hold it never match.
    async fn scan(
        &self,
        table: &str,
        column: &str,
    ) -> Result<(Vec<String>, Vec<Candidate>), SearchError> {
        let model = self.catalog.table(table).await?;
        let position = self.catalog.resolve_column(table, column).await?;
        let rows = self
            .catalog
            .store()
            .read_rows(table, DATA_START_ROW)
            .await?;
        let candidates = (DATA_START_ROW..)
            .zip(rows)
            .filter_map(|(row, values)| {
                let cell = values.get(position)?.clone();
                Some(Candidate { row, cell, values })
            })
            .collect();
        Ok((model.columns().to_vec(), candidates))
    }
}
