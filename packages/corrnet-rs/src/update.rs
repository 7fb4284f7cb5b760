//! Incremental sketch updates for a window series shifted by one.
//!
//! The exact variant shifts the summary arrays and re-aggregates. The DFT
//! variant folds the dropped and appended window contributions into the
//! previous correlation in constant arithmetic per pair, without revisiting
//! the per-window arrays beyond their running totals.

use crate::aggregate::correlate;
use crate::kernel::PairSketch;
use crate::types::Variant;

/// Drop window 0, shift left, and append the first window of `incoming`.
///
/// `incoming` must carry at least one basic window; both sketches must be the
/// same variant and pair.
pub fn shift_sketch(old: &PairSketch, incoming: &PairSketch) -> PairSketch {
    debug_assert_eq!(old.variant, incoming.variant);
    debug_assert!(incoming.windows() >= 1);

    let shift = |old_values: &[f64], incoming_values: &[f64]| -> Vec<f64> {
        if old_values.is_empty() {
            return Vec::new();
        }
        let mut values = Vec::with_capacity(old_values.len());
        values.extend_from_slice(&old_values[1..]);
        values.push(incoming_values[0]);
        values
    };

    PairSketch {
        pair: incoming.pair,
        variant: old.variant,
        mean_x: shift(&old.mean_x, &incoming.mean_x),
        mean_y: shift(&old.mean_y, &incoming.mean_y),
        sigma_x: shift(&old.sigma_x, &incoming.sigma_x),
        sigma_y: shift(&old.sigma_y, &incoming.sigma_y),
        cross: shift(&old.cross, &incoming.cross),
        sumsq_x: shift(&old.sumsq_x, &incoming.sumsq_x),
        sumsq_y: shift(&old.sumsq_y, &incoming.sumsq_y),
    }
}

/// Correlation of the one-window-shifted DFT series in O(1) per pair.
///
/// `old` is the DFT sketch of the previous W windows, `incoming` carries the
/// single new basic window, and `old_corr` is the last correlation recorded
/// for the pair. The result equals a fresh aggregation over the shifted
/// range.
///
/// Derivation sketch: with c_w = 1 - d_w^2/2 the DFT range correlation is
/// K / sqrt(Dx * Dy) where K = sum(sigma_x sigma_y c) + sum(delta_x delta_y)
/// and Dx = sum(sigma_x^2) + sum(delta_x^2) = W * var_x, with var_x the
/// aggregate variance recovered from sum(sumsq_x) and the per-window means.
/// Both K and the denominators shift by closed-form deltas when window 0 is
/// exchanged for the incoming window.
pub fn update_dft_corr(
    old: &PairSketch,
    incoming: &PairSketch,
    granularity: usize,
    old_corr: f64,
) -> f64 {
    debug_assert_eq!(old.variant, Variant::Dft);
    debug_assert_eq!(incoming.variant, Variant::Dft);
    debug_assert!(incoming.windows() >= 1);

    let w = old.windows() as f64;
    let n = granularity as f64 * w;

    let mu_x = old.mean_x.iter().sum::<f64>() / w;
    let mu_y = old.mean_y.iter().sum::<f64>() / w;
    let sumsq_x: f64 = old.sumsq_x.iter().sum();
    let sumsq_y: f64 = old.sumsq_y.iter().sum();

    // Aggregate variance over all W*g samples via the second moments; the
    // grand mean equals the mean of the equally sized window means.
    let var_x = (sumsq_x / n - mu_x * mu_x).max(0.0);
    let var_y = (sumsq_y / n - mu_y * mu_y).max(0.0);
    let denom_x_old = w * var_x;
    let denom_y_old = w * var_y;

    // Dropped window contributions, deltas against the old grand mean.
    let c_dropped = 1.0 - 0.5 * old.cross[0] * old.cross[0];
    let delta_x0 = old.mean_x[0] - mu_x;
    let delta_y0 = old.mean_y[0] - mu_y;

    // Incoming window, and the grand-mean shift it causes.
    let mean_x_new = incoming.mean_x[0];
    let mean_y_new = incoming.mean_y[0];
    let sigma_x_new = incoming.sigma_x[0];
    let sigma_y_new = incoming.sigma_y[0];
    let c_new = 1.0 - 0.5 * incoming.cross[0] * incoming.cross[0];
    let alpha_x = (mean_x_new - old.mean_x[0]) / w;
    let alpha_y = (mean_y_new - old.mean_y[0]) / w;
    let delta_x_new = mean_x_new - mu_x;
    let delta_y_new = mean_y_new - mu_y;

    let k_old = old_corr * w * var_x.sqrt() * var_y.sqrt();
    let k_new = k_old + sigma_x_new * sigma_y_new * c_new
        - old.sigma_x[0] * old.sigma_y[0] * c_dropped
        - delta_x0 * delta_y0
        - w * alpha_x * alpha_y
        + delta_x_new * delta_y_new;

    let denom_x_new = denom_x_old - old.sigma_x[0] * old.sigma_x[0] + sigma_x_new * sigma_x_new
        - delta_x0 * delta_x0
        + delta_x_new * delta_x_new
        - w * alpha_x * alpha_x;
    let denom_y_new = denom_y_old - old.sigma_y[0] * old.sigma_y[0] + sigma_y_new * sigma_y_new
        - delta_y0 * delta_y0
        + delta_y_new * delta_y_new
        - w * alpha_y * alpha_y;

    let denominator = (denom_x_new.max(0.0) * denom_y_new.max(0.0)).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    k_new / denominator
}

/// Fresh correlation of the shifted exact series; O(W) per pair.
pub fn update_exact_corr(old: &PairSketch, incoming: &PairSketch) -> (PairSketch, f64) {
    let shifted = shift_sketch(old, incoming);
    let corr = correlate(&shifted, 0, shifted.windows());
    (shifted, corr)
}
