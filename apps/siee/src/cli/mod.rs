//! # SIEE CLI Module
//!
//! This module implements the CLI interface for SIEE.
//!
//! ## Available Commands
//!
//! - `validate` - Check an institution configuration
//! - `evaluate` - Evaluate a cohort from a score sheet
//! - `window` - Show grading window status per term
//! - `admit` - Check whether a score may be entered now
//! - `activate` - Check (and apply) the draft → active transition
//! - `close` - Check (and apply) the active → closed transition
//! - `verify` - Compare a canonical export against a fresh evaluation
//! - `hash` - Compute BLAKE3 fingerprint of a cohort evaluation

mod commands;

use clap::{Parser, Subcommand};
use siee_core::SieeError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// SIEE - Institutional Student Evaluation System
///
/// Deterministic grade aggregation and promotion for a school year.
#[derive(Parser, Debug)]
#[command(name = "siee")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the institution configuration (TOML or JSON)
    #[arg(short, long, global = true, default_value = "siee.toml")]
    pub config: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the institution configuration
    Validate,

    /// Evaluate every student of a score sheet
    Evaluate {
        /// Path to the score sheet (JSON)
        #[arg(short, long)]
        scores: PathBuf,

        /// Write the canonical export to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only print this student's report
        #[arg(long)]
        student: Option<u64>,
    },

    /// Show the grading window of every term
    Window {
        /// Instant to evaluate at (RFC 3339); defaults to the system clock
        #[arg(long)]
        now: Option<String>,
    },

    /// Check whether a score may be entered for a term
    Admit {
        /// Term id
        #[arg(short, long)]
        term: u64,

        /// School grade id of the student
        #[arg(short, long)]
        grade: u64,

        /// Entered score (omit for an ungraded slot)
        #[arg(short, long)]
        score: Option<f64>,

        /// Instant to evaluate at (RFC 3339); defaults to the system clock
        #[arg(long)]
        now: Option<String>,
    },

    /// Check the draft → active transition
    Activate {
        /// Apply the transition and rewrite the configuration file
        #[arg(long)]
        apply: bool,
    },

    /// Check the active → closed transition against a score sheet
    Close {
        /// Path to the score sheet (JSON)
        #[arg(short, long)]
        scores: PathBuf,

        /// Apply the transition and rewrite the configuration file
        #[arg(long)]
        apply: bool,
    },

    /// Verify a canonical export against a fresh evaluation
    Verify {
        /// Path to the score sheet (JSON)
        #[arg(short, long)]
        scores: PathBuf,

        /// Canonical export to compare
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compute BLAKE3 fingerprint of a cohort evaluation
    Hash {
        /// Path to the score sheet (JSON)
        #[arg(short, long)]
        scores: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), SieeError> {
    let config = cli.config.as_path();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Validate) | None => cmd_validate(config, json_mode),
        Some(Commands::Evaluate {
            scores,
            output,
            student,
        }) => cmd_evaluate(config, &scores, output.as_deref(), student, json_mode),
        Some(Commands::Window { now }) => cmd_window(config, now.as_deref(), json_mode),
        Some(Commands::Admit {
            term,
            grade,
            score,
            now,
        }) => cmd_admit(config, term, grade, score, now.as_deref(), json_mode),
        Some(Commands::Activate { apply }) => cmd_activate(config, apply, json_mode),
        Some(Commands::Close { scores, apply }) => cmd_close(config, &scores, apply, json_mode),
        Some(Commands::Verify { scores, input }) => {
            cmd_verify(config, &scores, &input, json_mode)
        }
        Some(Commands::Hash { scores }) => cmd_hash(config, &scores, json_mode),
    }
}
