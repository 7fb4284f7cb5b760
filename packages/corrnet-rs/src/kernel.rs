//! Per-pair basic-window statistics.
//!
//! One forward pass over the aligned streams accumulates the five running
//! sums per window; means and sigmas come out of the two-moment identities.
//! The DFT variant additionally keeps the raw window samples, normalizes them
//! to unit energy, and takes the distance between the truncated spectra.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::types::{Pair, Variant};

/// Per-pair summary arrays, one entry per basic window.
///
/// `cross` holds c_xy for the exact variant and d_xy for the DFT variant.
/// `sumsq_x`/`sumsq_y` are only populated for the DFT variant, where the
/// incremental update path needs the raw second moments.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSketch {
    pub pair: Pair,
    pub variant: Variant,
    pub mean_x: Vec<f64>,
    pub mean_y: Vec<f64>,
    pub sigma_x: Vec<f64>,
    pub sigma_y: Vec<f64>,
    pub cross: Vec<f64>,
    pub sumsq_x: Vec<f64>,
    pub sumsq_y: Vec<f64>,
}

impl PairSketch {
    /// Number of basic windows summarized.
    pub fn windows(&self) -> usize {
        self.mean_x.len()
    }
}

/// Sketch one pair of aligned streams with basic windows of `granularity`
/// samples. Trailing samples that do not fill a window are discarded.
///
/// `ratio` selects how many DFT coefficients are kept (ceil(g * ratio)); it
/// is ignored by the exact variant.
pub fn sketch_streams(
    pair: Pair,
    x: &[f64],
    y: &[f64],
    granularity: usize,
    variant: Variant,
    ratio: f64,
) -> PairSketch {
    debug_assert_eq!(x.len(), y.len());
    debug_assert!(granularity > 0);

    let windows = x.len() / granularity;
    let g = granularity as f64;
    let coefficients = (g * ratio).ceil() as usize;

    let mut sketch = PairSketch {
        pair,
        variant,
        mean_x: Vec::with_capacity(windows),
        mean_y: Vec::with_capacity(windows),
        sigma_x: Vec::with_capacity(windows),
        sigma_y: Vec::with_capacity(windows),
        cross: Vec::with_capacity(windows),
        sumsq_x: Vec::new(),
        sumsq_y: Vec::new(),
    };
    if variant == Variant::Dft {
        sketch.sumsq_x.reserve(windows);
        sketch.sumsq_y.reserve(windows);
    }

    let mut spectrum_x = Vec::new();
    let mut spectrum_y = Vec::new();

    for w in 0..windows {
        let base = w * granularity;
        let wx = &x[base..base + granularity];
        let wy = &y[base..base + granularity];

        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_sq_x = 0.0;
        let mut sum_sq_y = 0.0;
        let mut sum_xy = 0.0;
        for k in 0..granularity {
            sum_x += wx[k];
            sum_y += wy[k];
            sum_sq_x += wx[k] * wx[k];
            sum_sq_y += wy[k] * wy[k];
            sum_xy += wx[k] * wy[k];
        }

        let mean_x = sum_x / g;
        let mean_y = sum_y / g;
        let sigma_x = (sum_sq_x / g - mean_x * mean_x).max(0.0).sqrt();
        let sigma_y = (sum_sq_y / g - mean_y * mean_y).max(0.0).sqrt();

        sketch.mean_x.push(mean_x);
        sketch.mean_y.push(mean_y);
        sketch.sigma_x.push(sigma_x);
        sketch.sigma_y.push(sigma_y);

        match variant {
            Variant::Exact => {
                let numerator = g * sum_xy - sum_x * sum_y;
                // g * sum_sq - sum^2 is g^2 * sigma^2, so the guarded sigmas
                // double as the denominator and no 0/0 can leak through.
                let c_xy = if numerator == 0.0 || sigma_x == 0.0 || sigma_y == 0.0 {
                    0.0
                } else {
                    numerator / (g * sigma_x * g * sigma_y)
                };
                sketch.cross.push(c_xy);
            }
            Variant::Dft => {
                let d_xy = if sigma_x == 0.0 || sigma_y == 0.0 {
                    0.0
                } else {
                    truncated_spectrum(wx, mean_x, sigma_x, coefficients, &mut spectrum_x);
                    truncated_spectrum(wy, mean_y, sigma_y, coefficients, &mut spectrum_y);
                    spectral_distance(&spectrum_x, &spectrum_y)
                };
                sketch.cross.push(d_xy);
                sketch.sumsq_x.push(sum_sq_x);
                sketch.sumsq_y.push(sum_sq_y);
            }
        }
    }

    sketch
}

/// First `coefficients` DFT coefficients of the unit-energy normalized window.
///
/// The window is normalized as (v - mean) / (sigma * sqrt(g)) before the
/// 1/sqrt(g)-scaled transform, so the full spectrum has unit energy and
/// 1 - d^2/2 reproduces the window correlation exactly (Parseval). Direct
/// summation; g is small and coefficients <= g.
fn truncated_spectrum(
    window: &[f64],
    mean: f64,
    sigma: f64,
    coefficients: usize,
    out: &mut Vec<Complex64>,
) {
    out.clear();
    let g = window.len() as f64;
    let norm = sigma * g.sqrt();
    let scale = 1.0 / g.sqrt();
    for k in 0..coefficients {
        let mut sum = Complex64::new(0.0, 0.0);
        for (t, &v) in window.iter().enumerate() {
            let z = (v - mean) / norm;
            let angle = 2.0 * PI * (k * t) as f64 / g;
            sum += Complex64::from_polar(z, angle);
        }
        out.push(scale * sum);
    }
}

fn spectral_distance(left: &[Complex64], right: &[Complex64]) -> f64 {
    left.iter()
        .zip(right)
        .map(|(l, r)| {
            let diff = (l - r).norm();
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

/// Single-pass Pearson correlation over two full raw streams.
///
/// Used by the direct construction modes and as the reference for the
/// sketched estimators. Returns 0 for constant streams.
pub fn pearson_direct(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len() as f64;

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;
    let mut sum_xy = 0.0;
    for k in 0..x.len() {
        sum_x += x[k];
        sum_y += y[k];
        sum_sq_x += x[k] * x[k];
        sum_sq_y += y[k] * y[k];
        sum_xy += x[k] * y[k];
    }

    let var_x = (sum_sq_x / n - (sum_x / n) * (sum_x / n)).max(0.0);
    let var_y = (sum_sq_y / n - (sum_y / n) * (sum_y / n)).max(0.0);
    let denominator = var_x.sqrt() * var_y.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    (sum_xy / n - (sum_x / n) * (sum_y / n)) / denominator
}
