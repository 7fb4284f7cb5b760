use corrnet_rs::aggregate::correlate;
use corrnet_rs::kernel::{pearson_direct, sketch_streams};
use corrnet_rs::partition::all_pairs;
use corrnet_rs::{
    construct_exact, construct_exact_parallel, construct_in_memory, construct_sketched, update,
    Matrix, MemoryStore, Pair, SketchParams, StreamTable, Variant,
};

/// Deterministic pseudo-random stream values in [-10, 10)
fn synth(seed: u64, n: usize) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % 2000) as f64 / 100.0 - 10.0
        })
        .collect()
}

fn ramp(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64 + 1.0).collect()
}

fn assert_symmetric(matrix: &Matrix) {
    for i in 0..matrix.size() {
        assert!(!matrix.get(i, i), "diagonal must stay clear");
        for j in 0..matrix.size() {
            assert_eq!(matrix.get(i, j), matrix.get(j, i));
        }
    }
}

#[test]
fn constant_streams_produce_no_edges() {
    let table = StreamTable::from_streams(vec![
        (1, vec![7.0; 10]),
        (2, vec![7.0; 10]),
        (3, vec![7.0; 10]),
    ])
    .unwrap();
    let matrix = Matrix::new(3);

    let params = SketchParams::new(0.01, 5);
    let (report, state) = construct_in_memory(&table, &matrix, &params).unwrap();
    assert_eq!(report.edges, 0);
    assert_symmetric(&matrix);

    for sketch in state.sketches.values() {
        assert_eq!(sketch.cross, vec![0.0, 0.0]);
    }
    assert_eq!(state.accurate.get(0, 1), 0.0);
}

#[test]
fn identical_streams_produce_an_edge_at_tau_one() {
    let values = ramp(8);
    let table =
        StreamTable::from_streams(vec![(1, values.clone()), (2, values.clone())]).unwrap();
    let matrix = Matrix::new(2);

    let params = SketchParams::new(1.0, 4);
    let (report, state) = construct_in_memory(&table, &matrix, &params).unwrap();
    assert_eq!(report.edges, 1);
    assert!(matrix.get(0, 1));
    assert!((state.accurate.get(0, 1) - 1.0).abs() < 1e-9);
}

#[test]
fn anti_correlated_streams_cross_the_threshold() {
    let x = ramp(8);
    let y: Vec<f64> = x.iter().rev().copied().collect();
    let table = StreamTable::from_streams(vec![(1, x), (2, y)]).unwrap();
    let matrix = Matrix::new(2);

    let params = SketchParams::new(0.9, 4);
    let (report, state) = construct_in_memory(&table, &matrix, &params).unwrap();
    assert_eq!(report.edges, 1);
    assert!((state.accurate.get(0, 1) + 1.0).abs() < 1e-9);
}

#[test]
fn exact_sketch_matches_direct_pearson_for_full_granularity() {
    let x = synth(17, 24);
    let y = synth(29, 24);
    let table = StreamTable::from_streams(vec![(1, x.clone()), (2, y.clone())]).unwrap();
    let matrix = Matrix::new(2);

    // g = T collapses the sketch to a single window.
    let params = SketchParams::new(0.5, 24);
    let (_, state) = construct_in_memory(&table, &matrix, &params).unwrap();
    let direct = pearson_direct(&x, &y);
    assert!((state.accurate.get(0, 1) - direct).abs() < 1e-9);
}

#[test]
fn dft_estimate_stays_close_for_low_frequency_signals() {
    // Energy concentrated at frequency one of sixteen keeps the truncated
    // spectrum representative at ratio 0.25.
    let g = 16usize;
    let t = 32usize;
    let a = 0.9f64;
    let b = (1.0 - a * a).sqrt();
    let x: Vec<f64> = (0..t)
        .map(|i| (2.0 * std::f64::consts::PI * (i % g) as f64 / g as f64).sin())
        .collect();
    let y: Vec<f64> = (0..t)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * (i % g) as f64 / g as f64;
            a * phase.sin() + b * phase.cos()
        })
        .collect();

    let exact = pearson_direct(&x, &y);
    assert!((exact - 0.9).abs() < 1e-9);

    let table = StreamTable::from_streams(vec![(1, x), (2, y)]).unwrap();
    let matrix = Matrix::new(2);
    let params = SketchParams::new(0.5, g).with_variant(Variant::Dft, 0.25);
    let (_, state) = construct_in_memory(&table, &matrix, &params).unwrap();

    let estimate = state.accurate.get(0, 1);
    assert!(
        (estimate - exact).abs() < 0.1,
        "estimate {} too far from exact {}",
        estimate,
        exact
    );
}

#[test]
fn full_ratio_dft_matches_exact_correlation() {
    let x = synth(5, 32);
    let y = synth(7, 32);
    let pair = Pair {
        left: 1,
        right: 2,
        row: 0,
        col: 1,
    };
    let exact = sketch_streams(pair, &x, &y, 8, Variant::Exact, 1.0);
    let dft = sketch_streams(pair, &x, &y, 8, Variant::Dft, 1.0);
    let corr_exact = correlate(&exact, 0, 4);
    let corr_dft = correlate(&dft, 0, 4);
    assert!((corr_exact - corr_dft).abs() < 1e-9);
}

fn structured_table() -> (StreamTable, usize) {
    let t = 24;
    let base = ramp(t);
    let doubled: Vec<f64> = base.iter().map(|v| 2.0 * v).collect();
    let negated: Vec<f64> = base.iter().map(|v| -v).collect();
    let constant = vec![3.0; t];
    let perturbed: Vec<f64> = base
        .iter()
        .enumerate()
        .map(|(i, v)| v + if i % 2 == 0 { 1.0 } else { -1.0 })
        .collect();

    let table = StreamTable::from_streams(vec![
        (10, base),
        (20, doubled),
        (30, negated),
        (40, constant),
        (50, perturbed),
    ])
    .unwrap();
    (table, 5)
}

#[test]
fn sketched_store_pipeline_matches_direct_construction() {
    let (table, n) = structured_table();
    let tau = 0.9;

    let direct = Matrix::new(n);
    construct_exact(&table, &direct, tau).unwrap();

    let parallel = Matrix::new(n);
    construct_exact_parallel(&table, &parallel, tau, Some(3)).unwrap();

    let sketched = Matrix::new(n);
    let store = MemoryStore::new();
    let params = SketchParams::new(tau, 4).with_blocks(3, 2);
    let report = construct_sketched(&table, &sketched, &store, &params).unwrap();

    assert_symmetric(&direct);
    assert_symmetric(&sketched);
    assert_eq!(report.edges, direct.count_edges());
    for i in 0..n {
        for j in 0..n {
            assert_eq!(direct.get(i, j), parallel.get(i, j));
            assert_eq!(direct.get(i, j), sketched.get(i, j));
        }
    }
}

#[test]
fn sketched_pipeline_drops_tables_on_success() {
    let (table, n) = structured_table();
    let store = MemoryStore::new();
    let matrix = Matrix::new(n);
    let params = SketchParams::new(0.9, 4).with_blocks(2, 2);
    construct_sketched(&table, &matrix, &store, &params).unwrap();
    assert!(store.table_len("pair_sketch_0").is_none());
}

#[test]
fn dft_store_pipeline_round_trips() {
    let (table, n) = structured_table();
    let store = MemoryStore::new();
    let matrix = Matrix::new(n);
    let params = SketchParams::new(0.9, 4)
        .with_variant(Variant::Dft, 1.0)
        .with_blocks(2, 2);
    let report = construct_sketched(&table, &matrix, &store, &params).unwrap();

    // Full-ratio DFT agrees with the exact decision for well separated pairs.
    let direct = Matrix::new(n);
    construct_exact(&table, &direct, 0.9).unwrap();
    assert_eq!(report.edges, direct.count_edges());
    assert_symmetric(&matrix);
}

#[test]
fn edge_set_is_monotone_in_tau() {
    let table = StreamTable::from_streams(vec![
        (1, synth(101, 24)),
        (2, synth(103, 24)),
        (3, synth(107, 24)),
        (4, synth(109, 24)),
        (5, ramp(24)),
        (6, ramp(24).iter().map(|v| v * 3.0).collect()),
    ])
    .unwrap();
    let n = table.num_locations();

    let loose = Matrix::new(n);
    let strict = Matrix::new(n);
    let (loose_report, _) =
        construct_in_memory(&table, &loose, &SketchParams::new(0.1, 4)).unwrap();
    let (strict_report, _) =
        construct_in_memory(&table, &strict, &SketchParams::new(0.6, 4)).unwrap();

    assert!(loose_report.edges >= strict_report.edges);
    for i in 0..n {
        for j in 0..n {
            if strict.get(i, j) {
                assert!(loose.get(i, j), "edge ({}, {}) lost at lower tau", i, j);
            }
        }
    }
}

#[test]
fn query_range_restricts_the_correlated_interval() {
    // Anti-correlated in window 0, identical afterwards.
    let mut x = ramp(4);
    x.extend_from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    let mut y: Vec<f64> = ramp(4).iter().rev().copied().collect();
    y.extend_from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);

    let table = StreamTable::from_streams(vec![(1, x), (2, y)]).unwrap();
    let store = MemoryStore::new();

    let full = Matrix::new(2);
    let params = SketchParams::new(0.95, 4).with_blocks(2, 2);
    construct_sketched(&table, &full, &store, &params).unwrap();
    assert!(!full.get(0, 1));

    let tail = Matrix::new(2);
    let params = SketchParams::new(0.95, 4).with_blocks(2, 2).with_query_range(1, 3);
    construct_sketched(&table, &tail, &store, &params).unwrap();
    assert!(tail.get(0, 1));
}

#[test]
fn incremental_update_matches_fresh_construction() {
    let granularity = 4;
    let t = 16;
    let seeds = [(1i64, 11u64), (2, 13), (3, 17), (4, 19)];

    let old_streams: Vec<(i64, Vec<f64>)> = seeds
        .iter()
        .map(|&(loc, seed)| (loc, synth(seed, t + granularity)))
        .collect();

    let table_old = StreamTable::from_streams(
        old_streams
            .iter()
            .map(|(loc, values)| (*loc, values[..t].to_vec()))
            .collect(),
    )
    .unwrap();
    let table_appended = StreamTable::from_streams(
        old_streams
            .iter()
            .map(|(loc, values)| (*loc, values[t..].to_vec()))
            .collect(),
    )
    .unwrap();
    let table_shifted = StreamTable::from_streams(
        old_streams
            .iter()
            .map(|(loc, values)| (*loc, values[granularity..].to_vec()))
            .collect(),
    )
    .unwrap();

    for variant in [Variant::Exact, Variant::Dft] {
        let params = SketchParams::new(0.3, granularity).with_variant(variant, 1.0);

        let matrix = Matrix::new(4);
        let (_, mut state) = construct_in_memory(&table_old, &matrix, &params).unwrap();
        matrix.clear();
        update(&table_appended, &mut state, &matrix, &params).unwrap();

        let fresh_matrix = Matrix::new(4);
        let (_, fresh_state) =
            construct_in_memory(&table_shifted, &fresh_matrix, &params).unwrap();

        for pair in all_pairs(table_old.locations()) {
            if variant == Variant::Dft {
                let updated = state.accurate.get(pair.row, pair.col);
                let fresh = fresh_state.accurate.get(pair.row, pair.col);
                assert!(
                    (updated - fresh).abs() < 1e-6,
                    "pair {:?}: updated {} vs fresh {}",
                    pair,
                    updated,
                    fresh
                );
            }
            assert_eq!(
                matrix.get(pair.row, pair.col),
                fresh_matrix.get(pair.row, pair.col),
                "edge mismatch for pair {:?}",
                pair
            );
        }
    }
}

#[test]
fn repeated_updates_track_the_sliding_series() {
    let granularity = 4;
    let total = 32;
    let seeds = [(1i64, 41u64), (2, 43), (3, 47)];
    let streams: Vec<(i64, Vec<f64>)> = seeds
        .iter()
        .map(|&(loc, seed)| (loc, synth(seed, total)))
        .collect();

    let window_count = 4 * granularity;
    let params = SketchParams::new(0.3, granularity).with_variant(Variant::Dft, 1.0);

    let table_old = StreamTable::from_streams(
        streams
            .iter()
            .map(|(loc, values)| (*loc, values[..window_count].to_vec()))
            .collect(),
    )
    .unwrap();
    let matrix = Matrix::new(3);
    let (_, mut state) = construct_in_memory(&table_old, &matrix, &params).unwrap();

    for step in 0..3 {
        let offset = window_count + step * granularity;
        let appended = StreamTable::from_streams(
            streams
                .iter()
                .map(|(loc, values)| (*loc, values[offset..offset + granularity].to_vec()))
                .collect(),
        )
        .unwrap();
        update(&appended, &mut state, &matrix, &params).unwrap();

        let shifted = StreamTable::from_streams(
            streams
                .iter()
                .map(|(loc, values)| {
                    let start = (step + 1) * granularity;
                    (*loc, values[start..start + window_count].to_vec())
                })
                .collect(),
        )
        .unwrap();
        let fresh_matrix = Matrix::new(3);
        let (_, fresh_state) =
            construct_in_memory(&shifted, &fresh_matrix, &params).unwrap();

        for pair in all_pairs(table_old.locations()) {
            let updated = state.accurate.get(pair.row, pair.col);
            let fresh = fresh_state.accurate.get(pair.row, pair.col);
            assert!(
                (updated - fresh).abs() < 1e-6,
                "step {} pair {:?}: {} vs {}",
                step,
                pair,
                updated,
                fresh
            );
        }
    }
}
