//! Read-only stream table: location id -> dense ordered sample values.

use std::collections::HashMap;

use crate::error::{CorrNetError, Result};

/// Immutable mapping from location id to a dense value sequence.
///
/// All streams share the same length; construction fails on mismatch.
/// Locations keep their first-appearance order, which fixes the matrix
/// row/column assignment for the whole run.
#[derive(Debug, Clone)]
pub struct StreamTable {
    locations: Vec<i64>,
    streams: HashMap<i64, Vec<f64>>,
    len: usize,
}

impl StreamTable {
    /// Build a table from `(location, values)` entries in presentation order.
    pub fn from_streams(entries: Vec<(i64, Vec<f64>)>) -> Result<Self> {
        let mut locations = Vec::with_capacity(entries.len());
        let mut streams = HashMap::with_capacity(entries.len());
        let mut len = None;

        for (location, values) in entries {
            let expected = *len.get_or_insert(values.len());
            if values.len() != expected {
                return Err(CorrNetError::DimensionMismatch {
                    location,
                    expected,
                    actual: values.len(),
                });
            }
            if streams.insert(location, values).is_some() {
                return Err(CorrNetError::InvalidParameter(format!(
                    "duplicate location {}",
                    location
                )));
            }
            locations.push(location);
        }

        let len = len.unwrap_or(0);
        if len == 0 {
            return Err(CorrNetError::InvalidParameter(
                "stream table has no samples".to_string(),
            ));
        }

        Ok(Self {
            locations,
            streams,
            len,
        })
    }

    /// Shared stream length T.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_locations(&self) -> usize {
        self.locations.len()
    }

    /// Location ids in first-appearance order.
    pub fn locations(&self) -> &[i64] {
        &self.locations
    }

    /// Full value slice for a location.
    pub fn stream(&self, location: i64) -> Result<&[f64]> {
        self.streams
            .get(&location)
            .map(|v| v.as_slice())
            .ok_or_else(|| {
                CorrNetError::InvalidParameter(format!("unknown location {}", location))
            })
    }

    /// Value slice for `[start, end)` sample indices of a location.
    pub fn slice(&self, location: i64, start: usize, end: usize) -> Result<&[f64]> {
        let stream = self.stream(location)?;
        if start > end || end > stream.len() {
            return Err(CorrNetError::InvalidParameter(format!(
                "sample range [{}, {}) outside stream of length {}",
                start,
                end,
                stream.len()
            )));
        }
        Ok(&stream[start..end])
    }

    /// Number of basic windows for a granularity; trailing samples are discarded.
    pub fn windows(&self, granularity: usize) -> usize {
        self.len / granularity
    }
}
