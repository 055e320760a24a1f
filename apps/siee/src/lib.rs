//! # siee
//!
//! The batch orchestrator around `siee-core`: file loading, the CLI, and
//! logging setup. All grading logic lives in the core crate.

pub mod cli;
pub mod input;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise tracing.
///
/// `SIEE_LOG_FORMAT=json` enables machine-parseable output. `RUST_LOG`
/// overrides the default filter.
pub fn init_tracing(verbose: bool) {
    let log_format = std::env::var("SIEE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if verbose {
        "siee=debug,siee_core=debug"
    } else {
        "siee=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    let result = match log_format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("Tracing already initialised: {}", e);
    }
}
