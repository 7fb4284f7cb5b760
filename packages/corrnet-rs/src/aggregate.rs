//! Range correlation over sketch arrays and edge emission.

use crate::kernel::PairSketch;
use crate::matrix::{AccurateMatrix, Matrix};
use crate::types::Variant;

/// Estimated Pearson correlation over basic windows `[w_start, w_end)`.
///
/// Summation runs in window order; a pair whose every selected window is
/// constant yields 0. The DFT estimate is returned unclamped (it can leave
/// [-1, 1] under aggressive truncation); callers clamp before thresholding.
pub fn correlate(sketch: &PairSketch, w_start: usize, w_end: usize) -> f64 {
    debug_assert!(w_start < w_end && w_end <= sketch.windows());

    let mean_x = &sketch.mean_x[w_start..w_end];
    let mean_y = &sketch.mean_y[w_start..w_end];
    let sigma_x = &sketch.sigma_x[w_start..w_end];
    let sigma_y = &sketch.sigma_y[w_start..w_end];
    let cross = &sketch.cross[w_start..w_end];

    let count = (w_end - w_start) as f64;
    let mu_x = mean_x.iter().sum::<f64>() / count;
    let mu_y = mean_y.iter().sum::<f64>() / count;

    let mut numerator = 0.0;
    let mut denom_x = 0.0;
    let mut denom_y = 0.0;
    for w in 0..mean_x.len() {
        let dx = mean_x[w] - mu_x;
        let dy = mean_y[w] - mu_y;
        match sketch.variant {
            Variant::Exact => {
                numerator += sigma_x[w] * sigma_y[w] * cross[w] + dx * dy;
            }
            Variant::Dft => {
                numerator += sigma_x[w] * sigma_y[w] * cross[w] * cross[w]
                    - 2.0 * sigma_x[w] * sigma_y[w]
                    - 2.0 * dx * dy;
            }
        }
        denom_x += sigma_x[w] * sigma_x[w] + dx * dx;
        denom_y += sigma_y[w] * sigma_y[w] + dy * dy;
    }

    let denominator = denom_x.sqrt() * denom_y.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    match sketch.variant {
        Variant::Exact => numerator / denominator,
        Variant::Dft => {
            let d_square = 2.0 + numerator / denominator;
            1.0 - 0.5 * d_square
        }
    }
}

/// Correlate over `[w_start, w_end)` and record an edge when |corr| >= tau.
///
/// The raw estimate is stored into the accurate matrix when one is attached;
/// the DFT estimate is clamped to [-1, 1] only for the threshold comparison.
/// Returns the raw correlation.
pub fn apply_edge(
    sketch: &PairSketch,
    w_start: usize,
    w_end: usize,
    tau: f64,
    matrix: &Matrix,
    accurate: Option<&AccurateMatrix>,
) -> f64 {
    let corr = correlate(sketch, w_start, w_end);
    let (row, col) = (sketch.pair.row, sketch.pair.col);
    if let Some(accurate) = accurate {
        accurate.set(row, col, corr);
    }
    let gate = match sketch.variant {
        Variant::Exact => corr,
        Variant::Dft => corr.clamp(-1.0, 1.0),
    };
    if gate.abs() >= tau {
        matrix.set_edge(row, col);
    }
    corr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{pearson_direct, sketch_streams};
    use crate::types::Pair;

    fn pair() -> Pair {
        Pair {
            left: 1,
            right: 2,
            row: 0,
            col: 1,
        }
    }

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 + 1.0).collect()
    }

    #[test]
    fn test_single_window_equals_direct_pearson() {
        // g = T collapses the aggregation to the window correlation itself.
        let x = [0.3, 1.9, -0.7, 2.5, 0.1, -1.2, 0.8, 1.4];
        let y = [1.1, 0.4, 0.9, -0.3, 2.2, 0.5, -0.8, 1.7];
        let sketch = sketch_streams(pair(), &x, &y, 8, Variant::Exact, 1.0);
        let corr = correlate(&sketch, 0, 1);
        assert!((corr - pearson_direct(&x, &y)).abs() < 1e-9);
    }

    #[test]
    fn test_multi_window_matches_direct_pearson() {
        let x = ramp(16);
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v - 40.0).collect();
        let sketch = sketch_streams(pair(), &x, &y, 4, Variant::Exact, 1.0);
        let corr = correlate(&sketch, 0, 4);
        assert!((corr - 1.0).abs() < 1e-9);

        let anti: Vec<f64> = x.iter().map(|v| -v).collect();
        let sketch = sketch_streams(pair(), &x, &anti, 4, Variant::Exact, 1.0);
        assert!((correlate(&sketch, 0, 4) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregation_over_mixed_windows() {
        // Window means differ, so both the sigma and delta terms contribute.
        let x = [1.0, 2.0, 3.0, 4.0, 10.0, 12.0, 9.0, 11.0, 5.0, 4.0, 6.0, 7.0];
        let y = [2.0, 1.0, 5.0, 3.0, 9.0, 13.0, 10.0, 10.0, 6.0, 5.0, 5.0, 8.0];
        let sketch = sketch_streams(pair(), &x, &y, 4, Variant::Exact, 1.0);
        let corr = correlate(&sketch, 0, 3);
        assert!((corr - pearson_direct(&x, &y)).abs() < 1e-9);
    }

    #[test]
    fn test_subrange_matches_direct_pearson_on_subrange() {
        let x = [1.0, 2.0, 3.0, 4.0, 10.0, 12.0, 9.0, 11.0, 5.0, 4.0, 6.0, 7.0];
        let y = [2.0, 1.0, 5.0, 3.0, 9.0, 13.0, 10.0, 10.0, 6.0, 5.0, 5.0, 8.0];
        let sketch = sketch_streams(pair(), &x, &y, 4, Variant::Exact, 1.0);
        let corr = correlate(&sketch, 1, 3);
        assert!((corr - pearson_direct(&x[4..12], &y[4..12])).abs() < 1e-9);
    }

    #[test]
    fn test_constant_streams_yield_zero() {
        let x = [7.0; 10];
        let sketch = sketch_streams(pair(), &x, &x, 5, Variant::Exact, 1.0);
        assert_eq!(correlate(&sketch, 0, 2), 0.0);
    }

    #[test]
    fn test_full_spectrum_dft_matches_exact() {
        let x = [1.0, 2.0, 3.0, 4.0, 10.0, 12.0, 9.0, 11.0, 5.0, 4.0, 6.0, 7.0];
        let y = [2.0, 1.0, 5.0, 3.0, 9.0, 13.0, 10.0, 10.0, 6.0, 5.0, 5.0, 8.0];
        let exact = sketch_streams(pair(), &x, &y, 4, Variant::Exact, 1.0);
        let dft = sketch_streams(pair(), &x, &y, 4, Variant::Dft, 1.0);
        let corr_exact = correlate(&exact, 0, 3);
        let corr_dft = correlate(&dft, 0, 3);
        assert!((corr_exact - corr_dft).abs() < 1e-9);
    }

    #[test]
    fn test_apply_edge_threshold_boundary() {
        let x = ramp(8);
        let sketch = sketch_streams(pair(), &x, &x, 4, Variant::Exact, 1.0);
        let corr = correlate(&sketch, 0, 2);

        let matrix = Matrix::new(2);
        apply_edge(&sketch, 0, 2, corr, &matrix, None);
        assert!(matrix.get(0, 1));

        let matrix = Matrix::new(2);
        let above = f64::from_bits(corr.to_bits() + 1);
        apply_edge(&sketch, 0, 2, above, &matrix, None);
        assert!(!matrix.get(0, 1));
    }

    #[test]
    fn test_apply_edge_records_accurate_value() {
        let x = ramp(8);
        let y: Vec<f64> = x.iter().map(|v| -v).collect();
        let sketch = sketch_streams(pair(), &x, &y, 4, Variant::Exact, 1.0);

        let matrix = Matrix::new(2);
        let accurate = AccurateMatrix::new(2);
        let corr = apply_edge(&sketch, 0, 2, 0.9, &matrix, Some(&accurate));
        assert!((corr + 1.0).abs() < 1e-9);
        assert_eq!(accurate.get(0, 1), corr);
        assert_eq!(accurate.get(1, 0), corr);
        assert!(matrix.get(0, 1));
    }
}
