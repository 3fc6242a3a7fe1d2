//! Error types for the Flotilla deployment planner.
//!
//! This module provides the error hierarchy for the whole reconciliation
//! lifecycle: plan loading and validation, diff computation, dependency
//! resolution, and command execution.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Flotilla.
#[derive(Debug, Error)]
pub enum FlotillaError {
    /// Plan document errors (loading and validation).
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// Reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Dependency graph errors.
    #[error("Dependency error: {0}")]
    Graph(#[from] GraphError),

    /// Helm invocation errors.
    #[error("Helm error: {0}")]
    Helm(#[from] HelmError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or validating a plan document.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan file was not found.
    #[error("Plan file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The plan file could not be parsed.
    #[error("Failed to parse plan: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// The same release name appears in more than one namespace.
    #[error(
        "Duplicate release name '{name}' (namespaces '{first_namespace}' and '{second_namespace}')"
    )]
    DuplicateRelease {
        /// The duplicated release name.
        name: String,
        /// Namespace of the first occurrence.
        first_namespace: String,
        /// Namespace of the second occurrence.
        second_namespace: String,
    },

    /// A release depends on a name that is not specified in its namespace.
    #[error("Release '{namespace}.{release}' depends on unknown release '{dependency}'")]
    UnknownDependency {
        /// Namespace of the dependent release.
        namespace: String,
        /// Name of the dependent release.
        release: String,
        /// The unresolvable dependency name.
        dependency: String,
    },

    /// The plan version tag is missing or empty.
    #[error("Plan version tag is missing or empty")]
    MissingVersion,
}

/// Errors raised while diffing desired state against deployed state.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A chart version could not be parsed as a semantic version.
    #[error("Release '{release}': cannot parse version '{version}': {message}")]
    VersionParse {
        /// Qualified name of the release being classified.
        release: String,
        /// The offending version string.
        version: String,
        /// Description of the parse failure.
        message: String,
    },
}

/// Errors raised while resolving the dependency graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The dependency graph contains a cycle.
    #[error("Circular dependency involving: {}", nodes.join(", "))]
    CircularDependency {
        /// The unresolved subgraph, sorted by node name.
        nodes: Vec<String>,
    },
}

/// Errors raised while invoking the external Helm binary.
#[derive(Debug, Error)]
pub enum HelmError {
    /// The command could not be spawned at all.
    #[error("Failed to spawn `{command}`: {message}")]
    SpawnFailed {
        /// The rendered command line.
        command: String,
        /// Description of the spawn failure.
        message: String,
    },

    /// A lifecycle command exited with a non-zero status.
    #[error("`{command}` exited with status {status}")]
    CommandFailed {
        /// The rendered command line.
        command: String,
        /// The exit status (-1 when killed by a signal).
        status: i32,
    },

    /// Listing the deployed releases failed.
    #[error("Failed to list deployed releases: {message}")]
    ListFailed {
        /// Description of the listing failure.
        message: String,
    },

    /// The release listing output could not be decoded.
    #[error("Invalid release listing output: {message}")]
    InvalidListOutput {
        /// Description of the decode failure.
        message: String,
    },
}

/// Result type alias for Flotilla operations.
pub type Result<T> = std::result::Result<T, FlotillaError>;

impl PlanError {
    /// Creates a parse error with an optional source location.
    #[must_use]
    pub fn parse(message: impl Into<String>, location: Option<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location,
        }
    }
}

impl ReconcileError {
    /// Creates a version-parse error for a specific release.
    #[must_use]
    pub fn version_parse(
        release: impl Into<String>,
        version: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::VersionParse {
            release: release.into(),
            version: version.into(),
            message: message.into(),
        }
    }
}

impl HelmError {
    /// Creates a listing failure with the given message.
    #[must_use]
    pub fn list_failed(message: impl Into<String>) -> Self {
        Self::ListFailed {
            message: message.into(),
        }
    }
}
