//! Shared adjacency and correlation matrices.
//!
//! Workers own disjoint (row, col) cells, so cells are relaxed atomics rather
//! than locked storage; results are published to the driver at the join
//! barrier that ends each phase.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Symmetric N x N 0/1 adjacency matrix with a zero diagonal.
///
/// Write-only during a pass: edges can be set but never unset.
pub struct Matrix {
    n: usize,
    cells: Vec<AtomicU8>,
}

impl Matrix {
    pub fn new(n: usize) -> Self {
        let cells = (0..n * n).map(|_| AtomicU8::new(0)).collect();
        Self { n, cells }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Reset every cell to 0.
    pub fn clear(&self) {
        for cell in &self.cells {
            cell.store(0, Ordering::Relaxed);
        }
    }

    /// Record an edge in both (i, j) and (j, i).
    pub fn set_edge(&self, i: usize, j: usize) {
        debug_assert!(i != j && i < self.n && j < self.n);
        self.cells[i * self.n + j].store(1, Ordering::Relaxed);
        self.cells[j * self.n + i].store(1, Ordering::Relaxed);
    }

    pub fn get(&self, i: usize, j: usize) -> bool {
        self.cells[i * self.n + j].load(Ordering::Relaxed) == 1
    }

    /// Number of 1s in the strict upper triangle.
    pub fn count_edges(&self) -> usize {
        let mut edges = 0;
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if self.get(i, j) {
                    edges += 1;
                }
            }
        }
        edges
    }
}

/// Symmetric N x N real matrix holding the last-computed correlation per pair.
///
/// Used by the DFT incremental update path; cells hold f64 bit patterns so
/// partitioned workers can write without locks.
pub struct AccurateMatrix {
    n: usize,
    cells: Vec<AtomicU64>,
}

impl AccurateMatrix {
    pub fn new(n: usize) -> Self {
        let zero = 0f64.to_bits();
        let cells = (0..n * n).map(|_| AtomicU64::new(zero)).collect();
        Self { n, cells }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Store a correlation in both (i, j) and (j, i).
    pub fn set(&self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.n && j < self.n);
        let bits = value.to_bits();
        self.cells[i * self.n + j].store(bits, Ordering::Relaxed);
        self.cells[j * self.n + i].store(bits, Ordering::Relaxed);
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        f64::from_bits(self.cells[i * self.n + j].load(Ordering::Relaxed))
    }
}
