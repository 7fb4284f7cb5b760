use serde::{Deserialize, Serialize};

use crate::error::{CorrNetError, Result};
use crate::table::StreamTable;

/// A single ingested observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: i64,
    pub latitude: i32,
    pub longitude: i32,
    pub value: f64,
}

impl Sample {
    /// Location key: the grid cell collapsed to one integer
    pub fn location(&self) -> i64 {
        self.longitude as i64 + 1000 * self.latitude as i64
    }
}

/// Unordered pair of distinct locations with its matrix coordinates
///
/// `left`/`right` are domain identities used to look up streams; `(row, col)`
/// is the matrix coordinate assigned by the nested i < j enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pair {
    pub left: i64,
    pub right: i64,
    pub row: usize,
    pub col: usize,
}

impl Pair {
    /// "left,right,row,col" key persisted alongside each sketch row
    pub fn key(&self) -> String {
        format!("{},{},{},{}", self.left, self.right, self.row, self.col)
    }
}

/// Correlation proxy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Per-window Pearson correlation as the cross-term
    Exact,
    /// Euclidean distance between truncated normalized spectra as the cross-term
    Dft,
}

/// Sketch configuration for one construction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchParams {
    /// Correlation threshold; an edge is recorded when |corr| >= tau
    pub tau: f64,
    /// Basic window size in samples
    pub granularity: usize,
    pub variant: Variant,
    /// DFT truncation ratio in (0, 1]; ignored by the exact variant
    pub ratio: f64,
    /// Rows per batched insert; 0 disables batching (one insert per row)
    pub write_block: usize,
    /// Ids per range scan during the query phase
    pub read_block: usize,
    /// Half-open basic-window range to correlate over; `None` means the full range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_range: Option<(usize, usize)>,
}

impl SketchParams {
    pub fn new(tau: f64, granularity: usize) -> Self {
        Self {
            tau,
            granularity,
            variant: Variant::Exact,
            ratio: 1.0,
            write_block: 100,
            read_block: 100,
            query_range: None,
        }
    }

    pub fn with_variant(mut self, variant: Variant, ratio: f64) -> Self {
        self.variant = variant;
        self.ratio = ratio;
        self
    }

    pub fn with_blocks(mut self, write_block: usize, read_block: usize) -> Self {
        self.write_block = write_block;
        self.read_block = read_block;
        self
    }

    pub fn with_query_range(mut self, w_start: usize, w_end: usize) -> Self {
        self.query_range = Some((w_start, w_end));
        self
    }

    /// Check the parameters against a concrete stream table.
    pub fn validate(&self, table: &StreamTable) -> Result<()> {
        if self.granularity == 0 || self.granularity > table.len() {
            return Err(CorrNetError::InvalidParameter(format!(
                "granularity must be in 1..={}, got {}",
                table.len(),
                self.granularity
            )));
        }
        if !(self.ratio > 0.0 && self.ratio <= 1.0) {
            return Err(CorrNetError::InvalidParameter(format!(
                "ratio must be in (0, 1], got {}",
                self.ratio
            )));
        }
        if self.read_block == 0 {
            return Err(CorrNetError::InvalidParameter(
                "read_block must be positive".to_string(),
            ));
        }
        let windows = table.windows(self.granularity);
        if let Some((w_start, w_end)) = self.query_range {
            if w_start >= w_end || w_end > windows {
                return Err(CorrNetError::InvalidParameter(format!(
                    "query range [{}, {}) outside the {} basic windows",
                    w_start, w_end, windows
                )));
            }
        }
        Ok(())
    }
}

/// Summary of one construction or update pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionReport {
    pub id: String,
    pub mode: String,
    pub locations: usize,
    pub pairs: usize,
    /// Basic windows per stream; 0 for the direct (unsketched) modes
    pub windows: usize,
    pub edges: usize,
    pub sketch_secs: f64,
    pub query_secs: f64,
    pub total_secs: f64,
    pub created_at: String,
}

impl ConstructionReport {
    pub fn new(mode: &str, locations: usize, pairs: usize, windows: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mode: mode.to_string(),
            locations,
            pairs,
            windows,
            edges: 0,
            sketch_secs: 0.0,
            query_secs: 0.0,
            total_secs: 0.0,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
