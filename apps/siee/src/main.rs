//! # SIEE - Institutional Student Evaluation System
//!
//! The batch binary around the deterministic SIEE engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │               apps/siee (THE BINARY)              │
//! │                                                   │
//! │  ┌─────────────┐   ┌──────────────────────────┐   │
//! │  │   CLI       │   │  Input / Output files    │   │
//! │  │  (clap)     │   │  (TOML, JSON, postcard)  │   │
//! │  └──────┬──────┘   └────────────┬─────────────┘   │
//! │         └───────────┬───────────┘                 │
//! │                     ▼                             │
//! │             ┌───────────────┐                     │
//! │             │   siee-core   │                     │
//! │             │  (THE LOGIC)  │                     │
//! │             └───────────────┘                     │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! siee -c siee.toml validate
//! siee -c siee.toml evaluate -s scores.json -o cohort.siee
//! siee -c siee.toml window --now 2025-03-01T08:00:00Z
//! siee -c siee.toml close -s scores.json --apply
//! ```

use clap::Parser;
use siee::cli;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    siee::init_tracing(cli.verbose);

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the SIEE startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗██╗███████╗███████╗
  ██╔════╝██║██╔════╝██╔════╝
  ███████╗██║█████╗  █████╗
  ╚════██║██║██╔══╝  ██╔══╝
  ███████║██║███████╗███████╗
  ╚══════╝╚═╝╚══════╝╚══════╝

  Institutional Student Evaluation v{}

  Deterministic • Configurable • Auditable
"#,
        env!("CARGO_PKG_VERSION")
    );
}
