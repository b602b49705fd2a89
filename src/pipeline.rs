//! Discovery → generation → composition → output
//!
//! ```text
//!  walker ──paths──▶ worker × N ──results──▶ collector ──▶ topo sort
//!     │                                        ▲   ▲          │
//!     └────────────errors──────────────────────┘   │          ▼
//!                  supervisor ──done───────────────┘   patch + compose ──▶ sink
//! ```
//!
//! The walker and the workers run on the blocking pool. The collector only
//! stops once the supervisor has seen every worker exit.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::chart::DependencyFilter;
use crate::compose::{apply_condition_patches, collect_condition_patches, compose_dependencies};
use crate::config::SchemaConfig;
use crate::discovery::search_charts;
use crate::error::{HelmSchemaError, Result};
use crate::generate::{ChartResult, SchemaGenerator, ValuesSchemaGenerator};
use crate::graph::{topo_sort, SortOutcome};

/// Everything the collection loop gathered
#[derive(Debug, Default)]
pub struct Collected {
    /// One result per discovered chart, sorted by Chart.yaml path
    pub results: Vec<ChartResult>,
    /// Discovery errors, already logged
    pub discovery_errors: Vec<HelmSchemaError>,
}

/// Summary of a full run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub results_processed: usize,
    pub charts_written: usize,
    pub failed_charts: usize,
    pub discovery_errors: usize,
    /// Set when the dependency graph had a cycle and input order was kept
    pub unsorted: bool,
}

impl RunReport {
    /// False when any chart failed to generate or be written
    pub fn is_success(&self) -> bool {
        self.failed_charts == 0
    }
}

/// Take paths off the shared queue until it is closed and drained.
fn worker(
    id: usize,
    queue: &Mutex<Receiver<PathBuf>>,
    generator: &dyn SchemaGenerator,
    results: &Sender<ChartResult>,
) {
    loop {
        // The lock is only held while waiting, so each path reaches one worker.
        let next = queue.blocking_lock().blocking_recv();
        let Some(path) = next else {
            break;
        };
        debug!(worker = id, path = %path.display(), "Generating schema");
        if results.blocking_send(generator.generate(&path)).is_err() {
            break;
        }
    }
    debug!(worker = id, "Worker finished");
}

/// Discover charts under `root` and generate one result per chart with
/// `workers` concurrent workers.
pub async fn collect_results(
    root: &Path,
    filter: &DependencyFilter,
    generator: Arc<dyn SchemaGenerator>,
    workers: usize,
) -> Collected {
    let (path_tx, path_rx) = mpsc::channel::<PathBuf>(1);
    let (result_tx, mut result_rx) = mpsc::channel::<ChartResult>(1);
    let (err_tx, mut err_rx) = mpsc::channel::<HelmSchemaError>(1);
    let (done_tx, mut done_rx) = oneshot::channel::<()>();

    let walker = {
        let root = root.to_path_buf();
        let filter = filter.clone();
        tokio::task::spawn_blocking(move || search_charts(&root, &filter, path_tx, err_tx))
    };

    let queue = Arc::new(Mutex::new(path_rx));
    let mut pool = JoinSet::new();
    for id in 0..workers.max(1) {
        let queue = Arc::clone(&queue);
        let results = result_tx.clone();
        let generator = Arc::clone(&generator);
        pool.spawn_blocking(move || worker(id, &queue, generator.as_ref(), &results));
    }
    drop(result_tx);

    // Workers send before they exit, so once all have joined no further
    // result can be produced.
    tokio::spawn(async move {
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!("Worker task failed: {}", e);
            }
        }
        let _ = done_tx.send(());
    });

    let mut collected = Collected::default();
    loop {
        tokio::select! {
            biased;
            Some(err) = err_rx.recv() => {
                error!("{}", err);
                collected.discovery_errors.push(err);
            }
            Some(result) = result_rx.recv() => collected.results.push(result),
            _ = &mut done_rx => break,
        }
    }

    while let Ok(result) = result_rx.try_recv() {
        collected.results.push(result);
    }
    if let Err(e) = walker.await {
        error!("Chart discovery failed: {}", e);
    }
    while let Some(err) = err_rx.recv().await {
        error!("{}", err);
        collected.discovery_errors.push(err);
    }

    collected.results.sort_by(|a, b| a.chart_path.cmp(&b.chart_path));
    info!(
        charts = collected.results.len(),
        errors = collected.discovery_errors.len(),
        "Collected generation results"
    );
    collected
}

/// Order, patch and compose results. Only a non-cycle sort failure is fatal.
pub fn resolve_dependencies(
    results: Vec<ChartResult>,
    filter: &DependencyFilter,
) -> Result<(Vec<ChartResult>, bool)> {
    let (mut results, unsorted) = match topo_sort(results, filter) {
        Ok(SortOutcome::Sorted(results)) => (results, false),
        Ok(SortOutcome::Cycle { cycle, results }) => {
            warn!("Could not sort results: circular dependency between {}", cycle.join(", "));
            (results, true)
        }
        Err(e) => {
            error!("Error while sorting results: {}", e);
            return Err(e);
        }
    };

    let patches = collect_condition_patches(&results, filter);
    apply_condition_patches(&mut results, &patches);
    compose_dependencies(&mut results, filter);

    Ok((results, unsorted))
}

/// Run the whole pipeline with the values-based generator
pub async fn run<W: Write>(config: &SchemaConfig, stdout: &mut W) -> Result<RunReport> {
    let generator = ValuesSchemaGenerator::new(config.generator_options()?);
    run_with_generator(config, Arc::new(generator), stdout).await
}

/// Run the whole pipeline with a custom generator
pub async fn run_with_generator<W: Write>(
    config: &SchemaConfig,
    generator: Arc<dyn SchemaGenerator>,
    stdout: &mut W,
) -> Result<RunReport> {
    let filter = config.dependency_filter();
    let Collected {
        results,
        discovery_errors,
    } = collect_results(&config.chart_search_root, &filter, generator, config.workers()).await;

    let mut report = RunReport {
        results_processed: results.len(),
        discovery_errors: discovery_errors.len(),
        ..RunReport::default()
    };

    let results = if config.no_dependencies {
        results
    } else {
        let (results, unsorted) = resolve_dependencies(results, &filter)?;
        report.unsorted = unsorted;
        results
    };

    let sink = config.sink();
    for result in &results {
        if !result.is_ok() {
            report.failed_charts += 1;
            if result.errors.is_empty() {
                error!("No chart descriptor produced for {}", result.label());
            } else {
                error!(
                    "Found {} errors while processing the chart {}",
                    result.errors.len(),
                    result.label()
                );
            }
            for e in &result.errors {
                error!("{}", e);
            }
            continue;
        }

        match sink.emit(result, stdout) {
            Ok(Some(_)) => report.charts_written += 1,
            Ok(None) => {}
            Err(e) => {
                report.failed_charts += 1;
                error!("Failed to output schema of chart {}: {}", result.label(), e);
            }
        }
    }

    Ok(report)
}
