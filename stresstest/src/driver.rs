//! Runs the benchmark matrix concurrently and persists per-point metrics.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use sketches_ddsketch::DDSketch;
use yansi::Paint;

use bookstore_client::{HttpBookStore, HttpStockManager};
use bookstore_service::{BookStore, InMemoryBookStore, StockManager};

use crate::config::Config;
use crate::generator::BookSetGenerator;
use crate::worker::{Worker, WorkerRunResult, WorkloadConfiguration};

/// How a benchmark point binds to the bookstore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Drive the in-process bookstore directly.
    Local,
    /// Drive a remote bookstore server over HTTP.
    Http,
}

impl ExecutionMode {
    /// The default sweep order: the in-process binding first, then HTTP.
    pub const SWEEP: [ExecutionMode; 2] = [ExecutionMode::Local, ExecutionMode::Http];
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Local => f.write_str("local"),
            ExecutionMode::Http => f.write_str("http"),
        }
    }
}

/// The two scalar metrics of one benchmark point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMetrics {
    /// Sum over workers of successful interactions per elapsed nanosecond.
    pub throughput: f64,
    /// Mean over workers of elapsed nanoseconds per attempted interaction.
    pub average_latency_ns: f64,
}

impl PointMetrics {
    /// Aggregates the per-worker results of one benchmark point.
    pub fn aggregate(results: &[WorkerRunResult]) -> Self {
        let mut throughput = 0.0;
        let mut latency = 0.0;
        for result in results {
            throughput += result.successful_interactions as f64 / result.elapsed_ns as f64;
            latency += result.elapsed_ns as f64 / result.total_runs as f64;
        }
        Self {
            throughput,
            average_latency_ns: latency / results.len() as f64,
        }
    }
}

/// Runs the full benchmark matrix described by the configuration.
///
/// Sweeps both execution modes (or the single pinned one) across
/// concurrency levels `1..=max_concurrency`. A failing benchmark point
/// aborts the run; metric lines of prior points remain untouched.
pub async fn run(config: &Config) -> Result<()> {
    std::fs::create_dir_all(&config.output_dir).context("failed to create output directory")?;

    let modes: &[ExecutionMode] = match &config.mode {
        Some(mode) => std::slice::from_ref(mode),
        None => &ExecutionMode::SWEEP,
    };

    for &mode in modes {
        for concurrency in 1..=config.max_concurrency {
            run_benchmark_point(config, mode, concurrency)
                .await
                .with_context(|| {
                    format!("benchmark point failed (mode: {mode}, concurrency: {concurrency})")
                })?;
        }
    }
    Ok(())
}

/// Runs one (mode, concurrency) point: seed, spawn, join, aggregate, persist.
async fn run_benchmark_point(
    config: &Config,
    mode: ExecutionMode,
    concurrency: usize,
) -> Result<()> {
    tracing::info!(%mode, concurrency, "running benchmark point");

    let (book_store, stock_manager) = make_collaborators(config, mode)?;

    // Workers need data to operate on; seeding must finish before any
    // worker starts, and a failed seed aborts the whole point.
    seed_stock(stock_manager.as_ref(), config.workload.initial_stock)
        .await
        .context("failed to seed initial stock")?;

    let mut tasks = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        let configuration = WorkloadConfiguration::new(
            config.workload.clone(),
            Arc::clone(&book_store),
            Arc::clone(&stock_manager),
        )?;
        tasks.push(tokio::spawn(Worker::new(configuration).run()));
    }

    let mut results = Vec::with_capacity(concurrency);
    for task in futures::future::join_all(tasks).await {
        // A worker that does not return at all is fatal for this point.
        results.push(task.context("worker crashed")?);
    }

    let metrics = PointMetrics::aggregate(&results);
    append_metric(
        &sink_path(&config.output_dir, "throughput", mode),
        metrics.throughput,
        concurrency,
    )?;
    append_metric(
        &sink_path(&config.output_dir, "latency", mode),
        metrics.average_latency_ns,
        concurrency,
    )?;

    print_point(mode, concurrency, &results, &metrics);

    // Dropping the handles releases any held connections before the next
    // concurrency level starts; pools are never reused across points.
    drop(book_store);
    drop(stock_manager);
    Ok(())
}

fn make_collaborators(
    config: &Config,
    mode: ExecutionMode,
) -> Result<(Arc<dyn BookStore>, Arc<dyn StockManager>)> {
    match mode {
        ExecutionMode::Local => {
            let store = InMemoryBookStore::new();
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
        ExecutionMode::Http => {
            let book_store = HttpBookStore::new(&config.server_address)?;
            let stock_manager = HttpStockManager::new(&config.server_address)?;
            Ok((Arc::new(book_store), Arc::new(stock_manager)))
        }
    }
}

async fn seed_stock(stock_manager: &dyn StockManager, count: usize) -> bookstore_types::Result<()> {
    let mut generator = BookSetGenerator::new();
    let books = generator.next_stock_books(count);
    stock_manager.add_books(&books).await
}

fn sink_path(output_dir: &Path, metric: &str, mode: ExecutionMode) -> PathBuf {
    output_dir.join(format!("{metric}_{mode}.txt"))
}

/// Appends one `"<metric>, <concurrency>"` line to the given sink.
fn append_metric(path: &Path, value: f64, concurrency: usize) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open metric sink {}", path.display()))?;
    writeln!(file, "{value}, {concurrency}")
        .with_context(|| format!("failed to append to metric sink {}", path.display()))?;
    Ok(())
}

fn print_point(
    mode: ExecutionMode,
    concurrency: usize,
    results: &[WorkerRunResult],
    metrics: &PointMetrics,
) {
    let successful: u64 = results.iter().map(|r| r.successful_interactions).sum();
    let total: u64 = results.iter().map(|r| r.total_runs).sum();

    let mut latencies = DDSketch::default();
    for result in results {
        latencies.add(result.elapsed_ns as f64 / result.total_runs as f64);
    }

    println!();
    println!(
        "{} (mode: {}, concurrency: {})",
        "## Benchmark point".bold(),
        mode.bold().blue(),
        concurrency.bold()
    );
    println!("  {}/{} interactions succeeded", successful.bold(), total);
    println!(
        "  throughput: {:.3e} successful interactions/ns",
        metrics.throughput.bold()
    );
    print_latencies(&latencies);
}

fn print_latencies(sketch: &DDSketch) {
    let count = sketch.count();
    if count == 0 {
        return;
    }
    let nanos = |value: f64| Duration::from_nanos(value as u64);
    let avg = nanos(sketch.sum().unwrap() / count as f64);
    let p50 = nanos(sketch.quantile(0.5).unwrap().unwrap());
    let p90 = nanos(sketch.quantile(0.9).unwrap().unwrap());
    let p99 = nanos(sketch.quantile(0.99).unwrap().unwrap());
    println!(
        "  per-worker latency avg: {:.2?}; p50: {p50:.2?}; p90: {p90:.2?}; p99: {p99:.2?}",
        avg.bold()
    );
}

#[cfg(test)]
mod tests {
    use crate::config::WorkloadParams;

    use super::*;

    fn result(successful: u64, elapsed_ns: u128, total_runs: u64) -> WorkerRunResult {
        WorkerRunResult {
            successful_interactions: successful,
            elapsed_ns,
            total_runs,
            successful_customer_interactions: successful,
            total_customer_interactions: total_runs,
        }
    }

    #[test]
    fn aggregation_matches_hand_computed_metrics() {
        let results = [
            result(10, 1_000_000_000, 10),
            result(20, 2_000_000_000, 20),
        ];

        let metrics = PointMetrics::aggregate(&results);
        assert_eq!(
            metrics.throughput,
            10.0 / 1_000_000_000.0 + 20.0 / 2_000_000_000.0
        );
        assert_eq!(metrics.average_latency_ns, 100_000_000.0);
    }

    #[test]
    fn metric_sinks_are_append_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = sink_path(dir.path(), "throughput", ExecutionMode::Local);

        append_metric(&path, 0.5, 1).unwrap();
        append_metric(&path, 0.25, 2).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines, vec!["0.5, 1", "0.25, 2"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn local_sweep_writes_one_line_per_point() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            mode: Some(ExecutionMode::Local),
            max_concurrency: 2,
            output_dir: dir.path().to_path_buf(),
            workload: WorkloadParams {
                warmup_runs: 2,
                measured_runs: 10,
                initial_stock: 50,
                ..WorkloadParams::default()
            },
            ..Config::default()
        };

        run(&config).await.unwrap();

        for metric in ["throughput", "latency"] {
            let path = sink_path(dir.path(), metric, ExecutionMode::Local);
            let contents = std::fs::read_to_string(&path).unwrap();
            let lines: Vec<_> = contents.lines().collect();
            assert_eq!(lines.len(), 2, "{metric} sink should have one line per level");
            assert!(lines[0].ends_with(", 1"));
            assert!(lines[1].ends_with(", 2"));
        }

        // The HTTP sinks were never touched.
        assert!(!sink_path(dir.path(), "throughput", ExecutionMode::Http).exists());
    }
}
