//! CLI module for the Flotilla deployment tool.
//!
//! This module provides the command-line interface for validating,
//! previewing, and applying deployment plans.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
