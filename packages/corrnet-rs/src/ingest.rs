//! Sample CSV ingestion.
//!
//! Rows are `timestamp,latitude,longitude,value`. A malformed row aborts the
//! run with its byte offset; a non-numeric first row is tolerated as a header.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{CorrNetError, Result};
use crate::table::StreamTable;
use crate::types::Sample;

/// Ingestion filters
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Stop reading once a timestamp >= this value is seen
    pub before: Option<i64>,
    /// Accept samples only from the first N distinct locations
    pub max_locations: Option<usize>,
}

/// Read a sample CSV into a stream table.
pub fn read_stream_table(path: &Path, options: &IngestOptions) -> Result<StreamTable> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut order: Vec<i64> = Vec::new();
    let mut streams: HashMap<i64, Vec<f64>> = HashMap::new();

    let mut line = String::new();
    let mut offset: u64 = 0;
    let mut total = 0usize;

    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        let line_offset = offset;
        offset += read as u64;

        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.trim().is_empty() {
            continue;
        }
        // A header is only accepted as the very first line of the file.
        if line_offset == 0 && !starts_numeric(trimmed) {
            continue;
        }

        let sample = parse_sample(trimmed, line_offset)?;
        if let Some(before) = options.before {
            if sample.timestamp >= before {
                break;
            }
        }

        let location = sample.location();
        match streams.get_mut(&location) {
            Some(values) => values.push(sample.value),
            None => {
                if let Some(cap) = options.max_locations {
                    if order.len() >= cap {
                        continue;
                    }
                }
                order.push(location);
                streams.insert(location, vec![sample.value]);
            }
        }
        total += 1;
    }

    log::info!(
        "ingested {} samples across {} locations from {}",
        total,
        order.len(),
        path.display()
    );

    let entries = order
        .into_iter()
        .map(|location| {
            let values = streams.remove(&location).unwrap_or_default();
            (location, values)
        })
        .collect();
    StreamTable::from_streams(entries)
}

fn starts_numeric(line: &str) -> bool {
    line.split(',')
        .next()
        .map(|field| field.trim().parse::<i64>().is_ok())
        .unwrap_or(false)
}

fn parse_sample(line: &str, offset: u64) -> Result<Sample> {
    let malformed = |reason: String| CorrNetError::MalformedSample { offset, reason };

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 4 {
        return Err(malformed(format!(
            "expected 4 fields, got {}",
            fields.len()
        )));
    }

    let timestamp = fields[0]
        .parse::<i64>()
        .map_err(|e| malformed(format!("bad timestamp: {}", e)))?;
    let latitude = fields[1]
        .parse::<i32>()
        .map_err(|e| malformed(format!("bad latitude: {}", e)))?;
    let longitude = fields[2]
        .parse::<i32>()
        .map_err(|e| malformed(format!("bad longitude: {}", e)))?;
    let value = fields[3]
        .parse::<f64>()
        .map_err(|e| malformed(format!("bad value: {}", e)))?;

    Ok(Sample {
        timestamp,
        latitude,
        longitude,
        value,
    })
}
