//! Correlation network construction over co-temporal sensor streams.
//!
//! Streams are summarized into per-pair basic-window sketches (mean, sigma,
//! and a cross-term that is either the window Pearson correlation or the
//! distance between truncated normalized spectra). Sketches aggregate over
//! any contiguous window range without revisiting raw data, persist through
//! a narrow store adapter, and update in constant work per pair when a new
//! basic window arrives.

pub mod aggregate;
pub mod construct;
pub mod error;
pub mod executor;
pub mod ingest;
pub mod kernel;
pub mod matrix;
pub mod partition;
pub mod store;
pub mod table;
pub mod types;
pub mod update;

pub use construct::{
    construct_exact, construct_exact_parallel, construct_in_memory, construct_sketched, update,
    InMemorySketches,
};
pub use error::{CorrNetError, Result};
pub use ingest::{read_stream_table, IngestOptions};
pub use matrix::{AccurateMatrix, Matrix};
pub use store::{MemoryStore, PostgresBackend, SketchStore, StoreBackend};
pub use table::StreamTable;
pub use types::{ConstructionReport, Pair, Sample, SketchParams, Variant};
