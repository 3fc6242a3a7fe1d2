//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Flotilla - declarative multi-release Helm deployments.
#[derive(Parser, Debug)]
#[command(name = "flotilla")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Namespaces to target (repeatable; all plan namespaces when omitted).
    #[arg(short = 'n', long = "namespace", global = true)]
    pub namespaces: Vec<String>,

    /// Enable verbose output, including command output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Helm binary to invoke.
    #[arg(long, global = true, env = "FLOTILLA_HELM_BIN", default_value = "helm")]
    pub helm_bin: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a plan document.
    Validate {
        /// Path to the plan file.
        plan: PathBuf,
    },

    /// Compute and display the operations a plan would apply.
    Plan {
        /// Path to the plan file.
        plan: PathBuf,
    },

    /// Apply a plan, converging deployed state to the specification.
    Apply {
        /// Path to the plan file.
        plan: PathBuf,

        /// Describe the operations but do not execute them.
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
