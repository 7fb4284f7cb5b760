//! Balanced pair partitioning for parallel workers.

use crate::types::Pair;

/// Split the N(N-1)/2 unordered pairs into `partitions` balanced lists.
///
/// Pairs are handed out in the nested enumeration order (i = 0..N, j = i+1..N)
/// so their concatenation equals the sequential pair order. The first
/// Q mod P partitions receive one extra pair, which bounds the imbalance at
/// a single pair.
pub fn partition_pairs(locations: &[i64], partitions: usize) -> Vec<Vec<Pair>> {
    assert!(partitions > 0, "at least one partition required");
    let n = locations.len();
    let total = n * n.saturating_sub(1) / 2;
    let quotient = total / partitions;
    let remainder = total % partitions;

    let mut out = Vec::with_capacity(partitions);
    let mut row = 0;
    let mut col = 1;
    for p in 0..partitions {
        let size = if p < remainder { quotient + 1 } else { quotient };
        let mut part = Vec::with_capacity(size);
        for _ in 0..size {
            part.push(Pair {
                left: locations[row],
                right: locations[col],
                row,
                col,
            });
            col += 1;
            if col == n {
                row += 1;
                col = row + 1;
            }
        }
        out.push(part);
    }
    out
}

/// All pairs in nested enumeration order.
pub fn all_pairs(locations: &[i64]) -> Vec<Pair> {
    partition_pairs(locations, 1).pop().unwrap_or_default()
}
