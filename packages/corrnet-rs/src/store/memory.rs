//! In-memory sketch store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::store::{SketchRow, SketchStore, StoreBackend, StoreError, StoreResult};

type Tables = HashMap<String, BTreeMap<usize, SketchRow>>;

/// Shared in-memory store; cloning yields another handle over the same
/// tables, which stands in for opening a new connection.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held by a table, if it exists.
    pub fn table_len(&self, table: &str) -> Option<usize> {
        self.tables.read().get(table).map(|rows| rows.len())
    }
}

impl StoreBackend for MemoryStore {
    type Handle = MemoryStore;

    fn open(&self) -> StoreResult<Self::Handle> {
        Ok(self.clone())
    }
}

impl SketchStore for MemoryStore {
    fn create_table(&mut self, table: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(table) {
            return Err(StoreError::TableExists(table.to_string()));
        }
        tables.insert(table.to_string(), BTreeMap::new());
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> StoreResult<()> {
        self.tables
            .write()
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    fn insert_batch(&mut self, table: &str, rows: &[SketchRow]) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let entries = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        for row in rows {
            if entries.contains_key(&row.id) {
                return Err(StoreError::DuplicateId {
                    table: table.to_string(),
                    id: row.id,
                });
            }
            entries.insert(row.id, row.clone());
        }
        Ok(())
    }

    fn scan(&mut self, table: &str, id_start: usize, id_end: usize) -> StoreResult<Vec<SketchRow>> {
        let tables = self.tables.read();
        let entries = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        Ok(entries
            .range(id_start..id_end)
            .map(|(_, row)| row.clone())
            .collect())
    }
}
