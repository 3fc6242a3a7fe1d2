//! Helm CLI release manager.
//!
//! Shells out to the `helm` binary: `helm list --output json` for the
//! deployed-release inventory, and `helm <kind> <args...>` for lifecycle
//! commands. All child processes are run to completion synchronously.

use crate::error::{FlotillaError, HelmError, Result};
use serde::Deserialize;
use std::io::Write;
use std::process::Command;
use tracing::debug;

use super::manager::{CommandKind, DeployedRelease, ReleaseManager};

/// Release manager backed by the Helm command-line client.
#[derive(Debug, Clone)]
pub struct HelmCli {
    /// Binary to invoke.
    binary: String,
}

/// Top-level shape of `helm list --output json`.
#[derive(Debug, Deserialize)]
struct ListOutput {
    #[serde(default, rename = "Releases")]
    releases: Vec<ListedRelease>,
}

/// One entry of `helm list --output json`.
#[derive(Debug, Deserialize)]
struct ListedRelease {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Namespace")]
    namespace: String,
    #[serde(rename = "Chart")]
    chart: String,
    #[serde(rename = "Revision")]
    revision: u32,
}

impl From<ListedRelease> for DeployedRelease {
    fn from(listed: ListedRelease) -> Self {
        Self {
            namespace: listed.namespace,
            name: listed.name,
            chart: listed.chart,
            revision: listed.revision,
        }
    }
}

impl HelmCli {
    /// Creates a release manager invoking the `helm` binary from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: String::from("helm"),
        }
    }

    /// Overrides the binary to invoke.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Renders a command line for diagnostics.
    fn render(&self, subcommand: &str, args: &[String]) -> String {
        let mut rendered = format!("{} {subcommand}", self.binary);
        for arg in args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }

    /// Decodes the JSON listing output.
    fn decode_list(stdout: &[u8]) -> Result<Vec<DeployedRelease>> {
        // helm prints nothing at all when no releases exist.
        if stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let parsed: ListOutput = serde_json::from_slice(stdout).map_err(|e| {
            FlotillaError::Helm(HelmError::InvalidListOutput {
                message: e.to_string(),
            })
        })?;

        Ok(parsed.releases.into_iter().map(Into::into).collect())
    }
}

impl Default for HelmCli {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseManager for HelmCli {
    fn list(&self) -> Result<Vec<DeployedRelease>> {
        let rendered = self.render("list", &[]);
        debug!("Executing `{rendered} --output json`");

        let output = Command::new(&self.binary)
            .args(["list", "--output", "json"])
            .output()
            .map_err(|e| {
                FlotillaError::Helm(HelmError::SpawnFailed {
                    command: rendered.clone(),
                    message: e.to_string(),
                })
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FlotillaError::Helm(HelmError::list_failed(
                stderr.trim().to_string(),
            )));
        }

        Self::decode_list(&output.stdout)
    }

    fn run(&self, kind: CommandKind, args: &[String], sink: &mut dyn Write) -> Result<()> {
        let rendered = self.render(kind.as_str(), args);
        debug!("Executing `{rendered}`");

        let output = Command::new(&self.binary)
            .arg(kind.as_str())
            .args(args)
            .output()
            .map_err(|e| {
                FlotillaError::Helm(HelmError::SpawnFailed {
                    command: rendered.clone(),
                    message: e.to_string(),
                })
            })?;

        sink.write_all(&output.stdout)?;
        sink.write_all(&output.stderr)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(FlotillaError::Helm(HelmError::CommandFailed {
                command: rendered,
                status: output.status.code().unwrap_or(-1),
            }))
        }
    }
}
