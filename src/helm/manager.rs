//! Release manager abstraction.
//!
//! The reconciliation engine and executor talk to the cluster exclusively
//! through the [`ReleaseManager`] trait: one call to enumerate deployed
//! releases, one call to run a lifecycle command. Production code uses the
//! Helm CLI implementation; tests substitute a recording fake.

use crate::error::Result;
use std::fmt;
use std::io::Write;

/// Lifecycle command kinds understood by the release manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Install a release from a chart.
    Install,
    /// Upgrade an existing release.
    Upgrade,
    /// Delete a release.
    Delete,
    /// Roll a release back to an earlier revision.
    Rollback,
}

impl CommandKind {
    /// Returns the subcommand name passed to the external binary.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Upgrade => "upgrade",
            Self::Delete => "delete",
            Self::Rollback => "rollback",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The observed state of one deployed release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedRelease {
    /// Namespace the release is deployed in.
    pub namespace: String,
    /// Release name.
    pub name: String,
    /// Chart identifier in `<chart>-<version>` form.
    pub chart: String,
    /// Monotonic revision counter; 1 means never revised.
    pub revision: u32,
}

impl DeployedRelease {
    /// Returns the `namespace.name` key of this release.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Returns the chart version, split off the chart identifier.
    ///
    /// Chart identifiers embed the version after the last hyphen
    /// (e.g. `nginx-ingress-1.6.0`); identifiers without a hyphen are
    /// returned whole and left for semantic-version parsing to reject.
    #[must_use]
    pub fn chart_version(&self) -> &str {
        self.chart
            .rsplit_once('-')
            .map_or(self.chart.as_str(), |(_, version)| version)
    }
}

/// External collaborator that observes and mutates deployed releases.
pub trait ReleaseManager {
    /// Enumerates all currently deployed releases.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be obtained or decoded.
    fn list(&self) -> Result<Vec<DeployedRelease>>;

    /// Runs one lifecycle command, forwarding its output to `sink`.
    ///
    /// Blocks until the command completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    fn run(&self, kind: CommandKind, args: &[String], sink: &mut dyn Write) -> Result<()>;
}
