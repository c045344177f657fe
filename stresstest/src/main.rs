//! This is a stresstest binary which drives configurable mixes of customer
//! and stock-manager interactions against a bookstore service.
//!
//! It sweeps concurrency levels across both the in-process and the HTTP
//! binding of the bookstore and appends one throughput and one latency
//! measurement per benchmark point to mode-specific output files.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::path::PathBuf;

use anyhow::Context;
use argh::FromArgs;
use tracing_subscriber::EnvFilter;

use stresstest::config::Config;

/// Stresstester for the bookstore service
#[derive(Debug, FromArgs)]
pub struct Args {
    /// path to the yaml configuration file; defaults apply when omitted
    #[argh(option, short = 'c')]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();
    let config = match args.config {
        Some(path) => {
            let file = std::fs::File::open(path).context("failed to open config file")?;
            serde_yaml::from_reader(file).context("failed to parse config YAML")?
        }
        None => Config::default(),
    };

    stresstest::run(&config).await
}
