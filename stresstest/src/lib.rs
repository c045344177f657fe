//! This is a stresstest library which drives configurable mixes of customer
//! and stock-manager interactions against a bookstore service.
//!
//! Simulated clients ([`Worker`]s) pick one of three interaction kinds per
//! iteration under a configurable probability distribution, run a warmup
//! phase before measuring, and report per-client success counts and timing.
//! The [driver](crate::driver) sweeps concurrency levels across both the
//! in-process and the HTTP binding of the bookstore and appends one
//! throughput and one latency measurement per benchmark point to
//! mode-specific output files.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod driver;
pub mod generator;
pub mod worker;

pub use crate::driver::run;
pub use crate::generator::BookSetGenerator;
pub use crate::worker::{Worker, WorkerRunResult, WorkloadConfiguration};
