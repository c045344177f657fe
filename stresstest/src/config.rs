//! Configuration of the benchmark matrix.

use std::path::PathBuf;

use serde::Deserialize;

use crate::driver::ExecutionMode;

/// Top-level configuration of a benchmark run.
///
/// Every field has a default, so the stresstest binary also runs without a
/// configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address of the bookstore server used by the HTTP binding.
    pub server_address: String,

    /// Highest concurrency level of the sweep; levels run from 1 up to and
    /// including this value.
    pub max_concurrency: usize,

    /// Pins the run to a single execution mode. When unset, the sweep runs
    /// the in-process binding first and the HTTP binding second.
    pub mode: Option<ExecutionMode>,

    /// Directory the metric sinks are appended under.
    pub output_dir: PathBuf,

    /// The workload the simulated clients run.
    pub workload: WorkloadParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "http://localhost:8081".into(),
            max_concurrency: 10,
            mode: None,
            output_dir: ".".into(),
            workload: WorkloadParams::default(),
        }
    }
}

/// Tunable parameters of the per-client workload.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkloadParams {
    /// Percentage of iterations running the rare stock-manager interaction.
    pub percent_rare_stock_manager: f32,

    /// Percentage of iterations running the frequent stock-manager
    /// interaction. The remainder up to 100 runs customer interactions.
    pub percent_frequent_stock_manager: f32,

    /// Iterations run before measurement starts, with outcomes discarded.
    pub warmup_runs: u64,

    /// Iterations run during the measured phase.
    pub measured_runs: u64,

    /// Synthetic candidate books per new-stock-acquisition interaction.
    pub num_books_to_add: usize,

    /// How many of the least-stocked books a replenishment touches.
    pub num_books_with_least_copies: usize,

    /// Copies added per book in a replenishment.
    pub num_add_copies: u32,

    /// Editor picks fetched per customer interaction.
    pub num_editor_picks: usize,

    /// Distinct books bought per customer interaction.
    pub num_books_to_buy: usize,

    /// Copies bought per selected book.
    pub num_book_copies_to_buy: u32,

    /// Synthetic books seeded into the store before workers start.
    pub initial_stock: usize,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            percent_rare_stock_manager: 10.0,
            percent_frequent_stock_manager: 40.0,
            warmup_runs: 100,
            measured_runs: 500,
            num_books_to_add: 5,
            num_books_with_least_copies: 5,
            num_add_copies: 10,
            num_editor_picks: 10,
            num_books_to_buy: 5,
            num_book_copies_to_buy: 1,
            initial_stock: 100,
        }
    }
}
