//! Driver API: the construction and update entry points consumed by the CLI.

use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;

use crate::aggregate::apply_edge;
use crate::error::{CorrNetError, Result};
use crate::executor::{run_naive_parallel, run_query_phase, run_sketch_phase};
use crate::kernel::{pearson_direct, sketch_streams, PairSketch};
use crate::matrix::{AccurateMatrix, Matrix};
use crate::partition::{all_pairs, partition_pairs};
use crate::store::{SketchStore, StoreBackend};
use crate::table::StreamTable;
use crate::types::{ConstructionReport, Pair, SketchParams, Variant};

/// Sketches retained by the in-memory pipeline, as needed by the update path.
pub struct InMemorySketches {
    pub sketches: HashMap<Pair, PairSketch>,
    pub accurate: AccurateMatrix,
}

/// Direct single-threaded construction over raw streams.
pub fn construct_exact(table: &StreamTable, matrix: &Matrix, tau: f64) -> Result<ConstructionReport> {
    let started = Instant::now();
    matrix.clear();
    let pairs = all_pairs(table.locations());
    for pair in &pairs {
        let x = table.stream(pair.left)?;
        let y = table.stream(pair.right)?;
        if pearson_direct(x, y).abs() >= tau {
            matrix.set_edge(pair.row, pair.col);
        }
    }

    let mut report = ConstructionReport::new("exact", table.num_locations(), pairs.len(), 0);
    report.edges = matrix.count_edges();
    report.total_secs = started.elapsed().as_secs_f64();
    log::info!(
        "exact construction: {} edges over {} pairs in {:.3}s",
        report.edges,
        report.pairs,
        report.total_secs
    );
    Ok(report)
}

/// Direct construction over `partitions` parallel workers.
pub fn construct_exact_parallel(
    table: &StreamTable,
    matrix: &Matrix,
    tau: f64,
    partitions: Option<usize>,
) -> Result<ConstructionReport> {
    let started = Instant::now();
    matrix.clear();
    let workers = partitions.unwrap_or_else(default_parallelism).max(1);
    let parts = partition_pairs(table.locations(), workers);
    let pair_count: usize = parts.iter().map(|p| p.len()).sum();
    run_naive_parallel(table, &parts, matrix, tau)?;

    let mut report =
        ConstructionReport::new("exact-parallel", table.num_locations(), pair_count, 0);
    report.edges = matrix.count_edges();
    report.total_secs = started.elapsed().as_secs_f64();
    log::info!(
        "exact parallel construction: {} edges over {} workers in {:.3}s",
        report.edges,
        workers,
        report.total_secs
    );
    Ok(report)
}

/// Full sketch, persist, and query pipeline against a durable store.
///
/// Per-partition tables are created up front and dropped only after a
/// successful query phase; on failure they are left behind for post-mortem.
pub fn construct_sketched<B: StoreBackend>(
    table: &StreamTable,
    matrix: &Matrix,
    backend: &B,
    params: &SketchParams,
) -> Result<ConstructionReport> {
    params.validate(table)?;
    let started = Instant::now();
    matrix.clear();

    let producers = default_parallelism().saturating_sub(1).max(1);
    let parts = partition_pairs(table.locations(), producers);
    let names = sketch_table_names(params.variant, producers);
    let pair_count: usize = parts.iter().map(|p| p.len()).sum();
    let windows = table.windows(params.granularity);

    let mut admin = backend.open()?;
    for name in &names {
        admin.create_table(name)?;
    }

    let sketch_started = Instant::now();
    run_sketch_phase(table, &parts, &names, backend, params)?;
    let sketch_secs = sketch_started.elapsed().as_secs_f64();
    log::info!("sketch phase finished in {:.3}s", sketch_secs);

    let query_started = Instant::now();
    run_query_phase(&parts, &names, backend, params, matrix, None, windows)?;
    let query_secs = query_started.elapsed().as_secs_f64();
    log::info!("query phase finished in {:.3}s", query_secs);

    for name in &names {
        admin.drop_table(name)?;
    }

    let mode = match params.variant {
        Variant::Exact => "sketched",
        Variant::Dft => "sketched-dft",
    };
    let mut report = ConstructionReport::new(mode, table.num_locations(), pair_count, windows);
    report.edges = matrix.count_edges();
    report.sketch_secs = sketch_secs;
    report.query_secs = query_secs;
    report.total_secs = started.elapsed().as_secs_f64();
    Ok(report)
}

/// Sketch and query entirely in memory, retaining the sketches and the
/// accurate matrix so an incremental update can follow.
pub fn construct_in_memory(
    table: &StreamTable,
    matrix: &Matrix,
    params: &SketchParams,
) -> Result<(ConstructionReport, InMemorySketches)> {
    params.validate(table)?;
    let started = Instant::now();
    matrix.clear();

    let pairs = all_pairs(table.locations());
    let windows = table.windows(params.granularity);

    let sketch_started = Instant::now();
    let sketched: Vec<PairSketch> = pairs
        .par_iter()
        .map(|pair| -> Result<PairSketch> {
            let x = table.stream(pair.left)?;
            let y = table.stream(pair.right)?;
            Ok(sketch_streams(
                *pair,
                x,
                y,
                params.granularity,
                params.variant,
                params.ratio,
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    let sketch_secs = sketch_started.elapsed().as_secs_f64();
    log::info!("in-memory sketch phase finished in {:.3}s", sketch_secs);

    let accurate = AccurateMatrix::new(table.num_locations());
    let (w_start, w_end) = params.query_range.unwrap_or((0, windows));

    let query_started = Instant::now();
    sketched.par_iter().for_each(|sketch| {
        let trimmed = trim_sketch(sketch, w_start, w_end);
        apply_edge(
            &trimmed,
            0,
            trimmed.windows(),
            params.tau,
            matrix,
            Some(&accurate),
        );
    });
    let query_secs = query_started.elapsed().as_secs_f64();
    log::info!("in-memory query phase finished in {:.3}s", query_secs);

    let mode = match params.variant {
        Variant::Exact => "in-memory",
        Variant::Dft => "in-memory-dft",
    };
    let mut report = ConstructionReport::new(mode, table.num_locations(), sketched.len(), windows);
    report.edges = matrix.count_edges();
    report.sketch_secs = sketch_secs;
    report.query_secs = query_secs;
    report.total_secs = started.elapsed().as_secs_f64();

    let sketches = sketched
        .into_iter()
        .map(|sketch| (sketch.pair, sketch))
        .collect();
    Ok((
        report,
        InMemorySketches {
            sketches,
            accurate,
        },
    ))
}

/// One incremental step: sketch the single appended basic window per pair and
/// refresh each pair's correlation for the window series shifted by one.
///
/// The exact variant shifts the summary arrays and re-aggregates; the DFT
/// variant applies the O(1) closed-form update against the accurate matrix.
/// Edges are recorded into `matrix` under the same threshold; the refreshed
/// sketches replace the old ones in `state`.
pub fn update(
    table_appended: &StreamTable,
    state: &mut InMemorySketches,
    matrix: &Matrix,
    params: &SketchParams,
) -> Result<ConstructionReport> {
    if table_appended.len() < params.granularity {
        return Err(CorrNetError::InvalidParameter(format!(
            "appended streams hold {} samples, one basic window of {} required",
            table_appended.len(),
            params.granularity
        )));
    }

    let started = Instant::now();
    let pairs = all_pairs(table_appended.locations());
    let windows = state
        .sketches
        .values()
        .next()
        .map(|sketch| sketch.windows())
        .unwrap_or(0);
    let mut refreshed = HashMap::with_capacity(pairs.len());

    for pair in &pairs {
        let old = state.sketches.remove(pair).ok_or_else(|| {
            CorrNetError::InvalidParameter(format!("no sketch held for pair {}", pair.key()))
        })?;
        let x = table_appended.slice(pair.left, 0, params.granularity)?;
        let y = table_appended.slice(pair.right, 0, params.granularity)?;
        let incoming = sketch_streams(
            *pair,
            x,
            y,
            params.granularity,
            params.variant,
            params.ratio,
        );

        match params.variant {
            Variant::Exact => {
                let (shifted, corr) = crate::update::update_exact_corr(&old, &incoming);
                if corr.abs() >= params.tau {
                    matrix.set_edge(pair.row, pair.col);
                }
                refreshed.insert(*pair, shifted);
            }
            Variant::Dft => {
                let old_corr = state.accurate.get(pair.row, pair.col);
                let corr =
                    crate::update::update_dft_corr(&old, &incoming, params.granularity, old_corr);
                state.accurate.set(pair.row, pair.col, corr);
                if corr.clamp(-1.0, 1.0).abs() >= params.tau {
                    matrix.set_edge(pair.row, pair.col);
                }
                refreshed.insert(*pair, crate::update::shift_sketch(&old, &incoming));
            }
        }
    }
    state.sketches = refreshed;

    let mut report = ConstructionReport::new(
        "update",
        table_appended.num_locations(),
        pairs.len(),
        windows,
    );
    report.edges = matrix.count_edges();
    report.total_secs = started.elapsed().as_secs_f64();
    log::info!(
        "incremental update over {} pairs in {:.3}s",
        report.pairs,
        report.total_secs
    );
    Ok(report)
}

fn trim_sketch(sketch: &PairSketch, w_start: usize, w_end: usize) -> PairSketch {
    if w_start == 0 && w_end == sketch.windows() {
        return sketch.clone();
    }
    let take = |values: &[f64]| -> Vec<f64> {
        if values.is_empty() {
            Vec::new()
        } else {
            values[w_start..w_end].to_vec()
        }
    };
    PairSketch {
        pair: sketch.pair,
        variant: sketch.variant,
        mean_x: take(&sketch.mean_x),
        mean_y: take(&sketch.mean_y),
        sigma_x: take(&sketch.sigma_x),
        sigma_y: take(&sketch.sigma_y),
        cross: take(&sketch.cross),
        sumsq_x: take(&sketch.sumsq_x),
        sumsq_y: take(&sketch.sumsq_y),
    }
}

fn sketch_table_names(variant: Variant, partitions: usize) -> Vec<String> {
    let prefix = match variant {
        Variant::Exact => "pair_sketch",
        Variant::Dft => "pair_sketch_dft",
    };
    (0..partitions)
        .map(|p| format!("{}_{}", prefix, p))
        .collect()
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}
