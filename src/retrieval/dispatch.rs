//! Parallel execution of window retrievals over a batch-scoped worker pool.

use crate::config::RsrConfig;
use crate::retrieval::decompose::StatisticalDecomposer;
use crate::retrieval::error::RetrievalError;
use crate::retrieval::frames::segment;
use crate::retrieval::invert::CoefficientInverter;
use crate::retrieval::processor::process_window;
use crate::retrieval::record::{aggregate, WindowResult};
use crate::utils::track::Track;
use itertools::{Either, Itertools};
use rayon::prelude::*;
use tracing::info;

type Result<T> = std::result::Result<T, RetrievalError>;

/// Retrieves every window of a track sequentially.
///
/// Same semantics as [`par_retrieve_track`] on a single thread of execution.
///
/// # Errors
/// Will return `Err` if the configuration is invalid or any window fails;
/// the error carries the identity of the failing window.
pub fn retrieve_track<D, I>(
    track: &Track,
    cfg: &RsrConfig,
    decomposer: &D,
    inverter: &I,
) -> Result<Vec<WindowResult>>
where
    D: StatisticalDecomposer,
    I: CoefficientInverter,
{
    cfg.validate()?;
    let windows = segment(track.len(), cfg.window_size, cfg.stride)?;

    let mut results = Vec::with_capacity(windows.len());
    for window in &windows {
        results.push(
            process_window(track, *window, cfg, decomposer, inverter)
                .map_err(|e| e.in_window(window))?,
        );
    }
    Ok(aggregate(results))
}

/// Retrieves every window of a track concurrently on a batch-scoped worker
/// pool.
///
/// Exactly one task runs per window and none is retried or dropped; the call
/// blocks until every task has completed. Any window failure fails the whole
/// batch so a partial table can never be mistaken for a complete one. The
/// returned table is ordered by window center regardless of completion
/// order.
///
/// # Errors
/// Will return `Err` if the configuration is invalid, the worker pool cannot
/// be built, or any window fails; a window error carries the identity of the
/// failing window.
pub fn par_retrieve_track<D, I>(
    track: &Track,
    cfg: &RsrConfig,
    decomposer: &D,
    inverter: &I,
) -> Result<Vec<WindowResult>>
where
    D: StatisticalDecomposer,
    I: CoefficientInverter,
{
    cfg.validate()?;
    let windows = segment(track.len(), cfg.window_size, cfg.stride)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.workers)
        .build()
        .map_err(|e| RetrievalError::InvalidConfig(format!("cannot build worker pool: {e}")))?;
    info!(
        windows = windows.len(),
        workers = cfg.workers,
        "dispatching retrieval batch"
    );

    let outcomes: Vec<Result<WindowResult>> = pool.install(|| {
        windows
            .par_iter()
            .map(|window| {
                process_window(track, *window, cfg, decomposer, inverter)
                    .map_err(|e| e.in_window(window))
            })
            .collect()
    });

    let (errors, results): (Vec<_>, Vec<_>) =
        outcomes.into_iter().partition_map(|outcome| match outcome {
            Err(e) => Either::Left(e),
            Ok(x) => Either::Right(x),
        });
    if let Some(error) = errors.into_iter().next() {
        Err(error)?;
    }
    Ok(aggregate(results))
}
