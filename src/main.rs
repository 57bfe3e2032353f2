//! `decontam` - scan one benchmark against one training manifest.
//!
//! Usage: `decontam <config.yaml>`. The report is printed to stdout as JSON;
//! logs go to stderr. `RUST_LOG` overrides the configured log level.

use std::process::ExitCode;

use anyhow::Context;
use decontam::{run_contamination_scan, DecontamConfig};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &DecontamConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .context("usage: decontam <config.yaml>")?;
    let config = DecontamConfig::from_file(&path)
        .with_context(|| format!("loading config {}", path.to_string_lossy()))?;
    init_tracing(&config);

    let report = run_contamination_scan(&config).context("contamination scan failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
