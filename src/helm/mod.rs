//! Helm integration module.
//!
//! Defines the release-manager seam the engine is written against, plus the
//! production implementation that drives the Helm CLI.

mod manager;
mod cli;

pub use manager::{CommandKind, DeployedRelease, ReleaseManager};
pub use cli::HelmCli;
