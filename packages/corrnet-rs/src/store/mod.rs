//! Sketch store adapters.
//!
//! A narrow contract over a durable backend: batched row inserts and
//! ascending id-range scans, with per-partition tables created before the
//! sketch phase and dropped after a successful query phase. Workers never
//! share a handle; each opens its own through the backend.

mod memory;
mod postgres;
mod row;

pub use self::memory::MemoryStore;
pub use self::postgres::{PostgresBackend, PostgresHandle};
pub use self::row::{SketchRow, MAX_COLUMN_CHARS};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in sketch store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("table already exists: {0}")]
    TableExists(String),

    #[error("duplicate row id {id} in table {table}")]
    DuplicateId { table: String, id: usize },

    #[error("malformed sketch row: {0}")]
    MalformedRow(String),

    #[error("database error: {0}")]
    Database(#[from] ::postgres::Error),
}

/// One open store handle. Each worker owns exactly one for its lifetime.
pub trait SketchStore {
    /// Create an empty sketch table.
    fn create_table(&mut self, table: &str) -> StoreResult<()>;

    /// Drop a sketch table and its rows.
    fn drop_table(&mut self, table: &str) -> StoreResult<()>;

    /// Append serialized sketch rows; ids must be unique within the table.
    fn insert_batch(&mut self, table: &str, rows: &[SketchRow]) -> StoreResult<()>;

    /// Rows with `id_start <= id < id_end` in ascending id order.
    fn scan(&mut self, table: &str, id_start: usize, id_end: usize) -> StoreResult<Vec<SketchRow>>;
}

/// Opens independent [`SketchStore`] handles, one per worker.
pub trait StoreBackend: Sync {
    type Handle: SketchStore;

    fn open(&self) -> StoreResult<Self::Handle>;
}
