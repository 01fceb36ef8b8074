//! Lazily loaded, cached column lists for every table.

use std::collections::HashMap;
use std::sync::Arc;

use roster_sheets::SheetStore;
use tokio::sync::RwLock;

use crate::error::SchemaError;
use crate::table::Table;

/// Column model of every table in the document.
///
/// Column lists are read from the header row on first use and cached. Adding
/// columns re-reads the remote header first, so a header extended by another
/// process is never truncated by a stale cache.
pub struct SchemaCatalog {
    store: Arc<dyn SheetStore>,
    cache: RwLock<HashMap<String, Table>>,
}

impl SchemaCatalog {
    #[must_use]
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The gateway this catalog reads through.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SheetStore> {
        &self.store
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, SchemaError> {
        Ok(self.store.list_tables().await?)
    }

    /// Create an empty table. Fails with
    /// [`roster_sheets::SheetsError::AlreadyExists`] if it is already there.
    pub async fn create_table(&self, name: &str) -> Result<(), SchemaError> {
        self.store.create_table(name).await?;
        self.cache
            .write()
            .await
            .insert(name.to_string(), Table::new(name, Vec::new()));
        Ok(())
    }

    /// The cached model of `table`, loading it on first use.
    pub async fn table(&self, table: &str) -> Result<Table, SchemaError> {
        if let Some(cached) = self.cache.read().await.get(table) {
            return Ok(cached.clone());
        }
        self.refresh(table).await
    }

    /// Column names in sheet order.
    pub async fn columns(&self, table: &str) -> Result<Vec<String>, SchemaError> {
        Ok(self.table(table).await?.columns().to_vec())
    }

    /// 0-based position of `column`.
    pub async fn resolve_column(&self, table: &str, column: &str) -> Result<usize, SchemaError> {
        self.table(table)
            .await?
            .position(column)
            .ok_or_else(|| SchemaError::ColumnNotFound {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    pub async fn has_column(&self, table: &str, column: &str) -> Result<bool, SchemaError> {
        Ok(self.table(table).await?.has_column(column))
    }

    /// Append `column` to the header unless it exists. Returns whether the
    /// header changed.
    pub async fn add_column(&self, table: &str, column: &str) -> Result<bool, SchemaError> {
        let added = self.add_columns(table, &[column.to_string()]).await?;
        Ok(!added.is_empty())
    }

    /// Append every missing column in one header write. Returns the columns
    /// that were added, in order.
    pub async fn add_columns(
        &self,
        table: &str,
        columns: &[String],
    ) -> Result<Vec<String>, SchemaError> {
        let mut cache = self.cache.write().await;
        let header = self
            .store
            .read_header(table)
            .await
            .map_err(|e| SchemaError::from_gateway(table, e))?;
        let mut model = Table::new(table, header);
        let added: Vec<String> = columns
            .iter()
            .filter(|c| model.push(c))
            .map(|c| c.trim().to_string())
            .collect();

        if !added.is_empty() {
            self.store
                .write_header(table, model.columns())
                .await
                .map_err(|e| SchemaError::from_gateway(table, e))?;
            tracing::info!(table, columns = ?added, "added columns");
        }
        cache.insert(table.to_string(), model);
        Ok(added)
    }

    /// Re-read the header of `table` and replace the cached model.
    pub async fn refresh(&self, table: &str) -> Result<Table, SchemaError> {
        let header = self
            .store
            .read_header(table)
            .await
            .map_err(|e| SchemaError::from_gateway(table, e))?;
        let model = Table::new(table, header);
        self.cache
            .write()
            .await
            .insert(table.to_string(), model.clone());
        tracing::debug!(table, columns = model.len(), "loaded header");
        Ok(model)
    }

    /// Drop the cached model of `table`.
    pub async fn invalidate(&self, table: &str) {
        self.cache.write().await.remove(table);
    }
}
