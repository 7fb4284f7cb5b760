//! Parallel execution shapes: direct construction workers, the sketch
//! pipeline (P producers, one writer over a bounded channel), and the query
//! workers that read sketches back.
//!
//! Matrix cells are partitioned by pair, so workers write disjoint cells and
//! results are published at the join barrier. Every worker opens exactly one
//! store handle and holds it for its lifetime.

use std::thread;
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::aggregate::apply_edge;
use crate::error::{CorrNetError, Result};
use crate::kernel::{pearson_direct, sketch_streams};
use crate::matrix::{AccurateMatrix, Matrix};
use crate::store::{SketchRow, SketchStore, StoreBackend};
use crate::table::StreamTable;
use crate::types::{Pair, SketchParams};

/// One writer-bound batch of serialized sketch rows.
struct RowBatch {
    table: String,
    rows: Vec<SketchRow>,
}

/// Direct construction: each worker computes full-stream Pearson correlations
/// for its partition and writes matrix cells, joined by the scope barrier.
pub fn run_naive_parallel(
    table: &StreamTable,
    partitions: &[Vec<Pair>],
    matrix: &Matrix,
    tau: f64,
) -> Result<()> {
    thread::scope(|scope| {
        let mut workers = Vec::new();
        for partition in partitions {
            workers.push(scope.spawn(move || naive_worker(table, partition, matrix, tau)));
        }
        join_workers(workers)
    })
}

fn naive_worker(table: &StreamTable, pairs: &[Pair], matrix: &Matrix, tau: f64) -> Result<()> {
    for pair in pairs {
        let x = table.stream(pair.left)?;
        let y = table.stream(pair.right)?;
        if pearson_direct(x, y).abs() >= tau {
            matrix.set_edge(pair.row, pair.col);
        }
    }
    Ok(())
}

/// Sketch phase: P sketch workers feed serialized row batches to one writer
/// over a bounded FIFO channel. With batching disabled (`write_block` = 0)
/// each worker inserts rows through its own handle and no writer runs.
///
/// The writer consumes exactly the number of batches the partition sizes
/// imply, so producer completion needs no close handshake.
pub fn run_sketch_phase<B: StoreBackend>(
    table: &StreamTable,
    partitions: &[Vec<Pair>],
    table_names: &[String],
    backend: &B,
    params: &SketchParams,
) -> Result<()> {
    let batches_total: usize = if params.write_block > 0 {
        partitions
            .iter()
            .map(|p| p.len().div_ceil(params.write_block))
            .sum()
    } else {
        0
    };
    let capacity = (partitions.len() * 2).max(4);
    let (sender, receiver) = bounded::<RowBatch>(capacity);

    thread::scope(|scope| {
        let mut workers = Vec::new();
        for (partition, table_name) in partitions.iter().zip(table_names) {
            let sender = sender.clone();
            workers.push(scope.spawn(move || {
                sketch_worker(table, partition, table_name, backend, params, sender)
            }));
        }
        drop(sender);

        let writer = if params.write_block > 0 {
            Some(scope.spawn(move || write_worker(backend, receiver, batches_total)))
        } else {
            drop(receiver);
            None
        };

        let workers_result = join_workers(workers);
        let writer_result = match writer {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            },
            None => Ok(()),
        };
        // A writer failure is the root cause when producers saw the channel close.
        writer_result.and(workers_result)
    })
}

fn sketch_worker<B: StoreBackend>(
    table: &StreamTable,
    pairs: &[Pair],
    table_name: &str,
    backend: &B,
    params: &SketchParams,
    sender: Sender<RowBatch>,
) -> Result<()> {
    let started = Instant::now();
    let mut handle = backend.open()?;
    let mut batch: Vec<SketchRow> = Vec::new();

    for (id, pair) in pairs.iter().enumerate() {
        let x = table.stream(pair.left)?;
        let y = table.stream(pair.right)?;
        let sketch = sketch_streams(*pair, x, y, params.granularity, params.variant, params.ratio);
        let row = SketchRow::encode(&sketch, id)?;

        if params.write_block == 0 {
            handle.insert_batch(table_name, std::slice::from_ref(&row))?;
        } else {
            batch.push(row);
            if batch.len() == params.write_block {
                send_batch(&sender, table_name, &mut batch)?;
            }
        }
    }
    if !batch.is_empty() {
        send_batch(&sender, table_name, &mut batch)?;
    }

    log::debug!(
        "sketch worker for {} finished {} pairs in {:.3}s",
        table_name,
        pairs.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

fn send_batch(sender: &Sender<RowBatch>, table: &str, batch: &mut Vec<SketchRow>) -> Result<()> {
    let rows = std::mem::take(batch);
    sender
        .send(RowBatch {
            table: table.to_string(),
            rows,
        })
        .map_err(|_| CorrNetError::PipelineClosed)
}

fn write_worker<B: StoreBackend>(
    backend: &B,
    receiver: Receiver<RowBatch>,
    batches_total: usize,
) -> Result<()> {
    let mut handle = backend.open()?;
    let started = Instant::now();
    let mut written = 0usize;
    for _ in 0..batches_total {
        let batch = match receiver.recv() {
            Ok(batch) => batch,
            // All producers are gone; one of them failed upstream.
            Err(_) => break,
        };
        handle.insert_batch(&batch.table, &batch.rows)?;
        written += 1;
    }
    log::info!(
        "writer persisted {} of {} batches in {:.3}s",
        written,
        batches_total,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Query phase: P workers scan their partition table in `read_block` id
/// ranges, decode, aggregate, and write their disjoint matrix cells.
pub fn run_query_phase<B: StoreBackend>(
    partitions: &[Vec<Pair>],
    table_names: &[String],
    backend: &B,
    params: &SketchParams,
    matrix: &Matrix,
    accurate: Option<&AccurateMatrix>,
    windows: usize,
) -> Result<()> {
    thread::scope(|scope| {
        let mut workers = Vec::new();
        for (partition, table_name) in partitions.iter().zip(table_names) {
            workers.push(scope.spawn(move || {
                query_worker(
                    partition.len(),
                    table_name,
                    backend,
                    params,
                    matrix,
                    accurate,
                    windows,
                )
            }));
        }
        join_workers(workers)
    })
}

fn query_worker<B: StoreBackend>(
    pair_count: usize,
    table_name: &str,
    backend: &B,
    params: &SketchParams,
    matrix: &Matrix,
    accurate: Option<&AccurateMatrix>,
    windows: usize,
) -> Result<()> {
    let started = Instant::now();
    let mut handle = backend.open()?;
    let (w_start, w_end) = params.query_range.unwrap_or((0, windows));

    let mut id_start = 0;
    while id_start < pair_count {
        let id_end = (id_start + params.read_block).min(pair_count);
        for row in handle.scan(table_name, id_start, id_end)? {
            let sketch = row
                .decode(w_start, w_end, params.variant)
                .map_err(CorrNetError::Store)?;
            apply_edge(&sketch, 0, sketch.windows(), params.tau, matrix, accurate);
        }
        id_start = id_end;
    }

    log::debug!(
        "query worker for {} finished {} pairs in {:.3}s",
        table_name,
        pair_count,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

fn join_workers(handles: Vec<thread::ScopedJoinHandle<'_, Result<()>>>) -> Result<()> {
    let mut first_error = None;
    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
