//! Serialized sketch row format.
//!
//! One row per pair: `(id, pair_key, mean_x, mean_y, sigma_x, sigma_y,
//! cross)` where the array columns are comma-separated decimals with five
//! fractional digits and the pair key is `left,right,row,col`. Each column is
//! capped at [`MAX_COLUMN_CHARS`] characters to stay within a generic column
//! store's limits; exceeding the cap is fatal to the run.

use crate::error::{CorrNetError, Result};
use crate::kernel::PairSketch;
use crate::store::{StoreError, StoreResult};
use crate::types::{Pair, Variant};

/// Per-column character limit of the backing stores.
pub const MAX_COLUMN_CHARS: usize = 10_000;

/// A sketch serialized for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SketchRow {
    pub id: usize,
    pub pair: String,
    pub mean_x: String,
    pub mean_y: String,
    pub sigma_x: String,
    pub sigma_y: String,
    /// c_xy for the exact variant, d_xy for the DFT variant
    pub cross: String,
}

impl SketchRow {
    /// Serialize a sketch under the given row id.
    pub fn encode(sketch: &PairSketch, id: usize) -> Result<Self> {
        Ok(Self {
            id,
            pair: sketch.pair.key(),
            mean_x: join_values(&sketch.mean_x)?,
            mean_y: join_values(&sketch.mean_y)?,
            sigma_x: join_values(&sketch.sigma_x)?,
            sigma_y: join_values(&sketch.sigma_y)?,
            cross: join_values(&sketch.cross)?,
        })
    }

    /// Decode the window range `[w_start, w_end)` back into a sketch.
    pub fn decode(&self, w_start: usize, w_end: usize, variant: Variant) -> StoreResult<PairSketch> {
        Ok(PairSketch {
            pair: parse_pair_key(&self.pair)?,
            variant,
            mean_x: split_values(&self.mean_x, w_start, w_end)?,
            mean_y: split_values(&self.mean_y, w_start, w_end)?,
            sigma_x: split_values(&self.sigma_x, w_start, w_end)?,
            sigma_y: split_values(&self.sigma_y, w_start, w_end)?,
            cross: split_values(&self.cross, w_start, w_end)?,
            sumsq_x: Vec::new(),
            sumsq_y: Vec::new(),
        })
    }
}

fn join_values(values: &[f64]) -> Result<String> {
    let mut out = String::with_capacity(values.len() * 8);
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!("{:.5}", value));
    }
    if out.len() > MAX_COLUMN_CHARS {
        return Err(CorrNetError::RowOverflow {
            actual: out.len(),
            limit: MAX_COLUMN_CHARS,
        });
    }
    Ok(out)
}

fn split_values(column: &str, start: usize, end: usize) -> StoreResult<Vec<f64>> {
    let mut values = Vec::with_capacity(end - start);
    for (index, field) in column.split(',').enumerate() {
        if index < start {
            continue;
        }
        if index >= end {
            break;
        }
        let value = field
            .parse::<f64>()
            .map_err(|e| StoreError::MalformedRow(format!("bad value {:?}: {}", field, e)))?;
        values.push(value);
    }
    if values.len() != end - start {
        return Err(StoreError::MalformedRow(format!(
            "column holds {} windows, range [{}, {}) requested",
            column.split(',').count(),
            start,
            end
        )));
    }
    Ok(values)
}

fn parse_pair_key(key: &str) -> StoreResult<Pair> {
    let malformed = || StoreError::MalformedRow(format!("bad pair key {:?}", key));
    let fields: Vec<&str> = key.split(',').collect();
    if fields.len() != 4 {
        return Err(malformed());
    }
    Ok(Pair {
        left: fields[0].parse().map_err(|_| malformed())?,
        right: fields[1].parse().map_err(|_| malformed())?,
        row: fields[2].parse().map_err(|_| malformed())?,
        col: fields[3].parse().map_err(|_| malformed())?,
    })
}
