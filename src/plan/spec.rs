//! Plan document types for multi-release deployments.
//!
//! This module defines the structs that map to the plan YAML file. A plan
//! declares, per namespace, the releases to converge and their in-namespace
//! dependencies. Each release carries one flag set per lifecycle command
//! kind; flag values are booleans, strings, or ordered string lists, and
//! default values are omitted from the generated argument vectors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A namespace maps release names to their definitions.
pub type Namespace = BTreeMap<String, Release>;

/// The root plan document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    /// Plan format version tag.
    pub version: String,
    /// Mapping of namespace name to the releases it contains.
    #[serde(default)]
    pub namespaces: BTreeMap<String, Namespace>,
}

/// A single release declaration inside a namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    /// Chart spec and per-command flag sets.
    pub spec: ReleaseSpec,
    /// Names of same-namespace releases that must converge first.
    #[serde(default)]
    pub depends: Vec<String>,
}

/// Chart identity and lifecycle flags for one release.
///
/// The namespace and name are stamped in by [`Plan::conform`] after loading;
/// they are not part of the document itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseSpec {
    #[serde(skip)]
    name: String,
    #[serde(skip)]
    namespace: String,

    /// Chart identifier (e.g. `stable/nginx-ingress`).
    pub chart: String,
    /// Per-command flag sets.
    #[serde(default)]
    pub flags: OperationFlags,
}

/// Flag sets for every lifecycle command kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OperationFlags {
    /// Flags for the install command.
    pub install: InstallFlags,
    /// Flags for the upgrade command.
    pub upgrade: UpgradeFlags,
    /// Flags for the delete command.
    pub delete: DeleteFlags,
    /// Flags for the rollback command.
    pub rollback: RollbackFlags,
}

/// Flags accepted by the install command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstallFlags {
    /// CA bundle used to verify chart downloads.
    pub ca_file: String,
    /// Client certificate file.
    pub cert_file: String,
    /// Development version filter.
    pub devel: String,
    /// Simulate the install.
    pub dry_run: bool,
    /// Client key file.
    pub key_file: String,
    /// Keyring containing public signing keys.
    pub keyring: String,
    /// Release name (stamped from the plan).
    pub name: String,
    /// Template used to generate a release name.
    pub name_template: String,
    /// Target namespace (stamped from the plan).
    pub namespace: String,
    /// Disable pre/post hooks.
    pub no_hooks: bool,
    /// Re-use a deleted release name.
    pub replace: bool,
    /// Chart repository URL.
    pub repo: String,
    /// Inline value overrides.
    pub set: Vec<String>,
    /// Seconds to wait for the operation.
    pub timeout: String,
    /// Enable TLS for the connection.
    pub tls: bool,
    /// TLS CA certificate path.
    pub tls_ca_cert: String,
    /// TLS certificate path.
    pub tls_cert: String,
    /// TLS key path.
    pub tls_key: String,
    /// Verify the remote certificate.
    pub tls_verify: bool,
    /// Value override files.
    pub values: Vec<String>,
    /// Verify the chart provenance.
    pub verify: bool,
    /// Exact chart version to install.
    pub version: String,
    /// Wait for resources to become ready.
    pub wait: bool,
}

/// Flags accepted by the upgrade command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct UpgradeFlags {
    /// CA bundle used to verify chart downloads.
    pub ca_file: String,
    /// Client certificate file.
    pub cert_file: String,
    /// Development version filter.
    pub devel: String,
    /// Simulate the upgrade.
    pub dry_run: bool,
    /// Force resource updates by delete/recreate.
    pub force: bool,
    /// Install the release if it does not exist.
    pub install: bool,
    /// Client key file.
    pub key_file: String,
    /// Keyring containing public signing keys.
    pub keyring: String,
    /// Target namespace (stamped from the plan).
    pub namespace: String,
    /// Disable pre/post hooks.
    pub no_hooks: bool,
    /// Recreate pods for the release.
    pub recreate_pods: bool,
    /// Chart repository URL.
    pub repo: String,
    /// Reset values to chart defaults.
    pub reset_values: bool,
    /// Re-use the last release's values.
    pub reuse_values: bool,
    /// Inline value overrides.
    pub set: Vec<String>,
    /// Seconds to wait for the operation.
    pub timeout: String,
    /// Enable TLS for the connection.
    pub tls: bool,
    /// TLS CA certificate path.
    pub tls_ca_cert: String,
    /// TLS certificate path.
    pub tls_cert: String,
    /// TLS key path.
    pub tls_key: String,
    /// Verify the remote certificate.
    pub tls_verify: bool,
    /// Value override files.
    pub values: Vec<String>,
    /// Verify the chart provenance.
    pub verify: bool,
    /// Exact chart version to upgrade to.
    pub version: String,
    /// Wait for resources to become ready.
    pub wait: bool,
}

/// Flags accepted by the delete command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct DeleteFlags {
    /// Simulate the delete.
    pub dry_run: bool,
    /// Disable pre/post hooks.
    pub no_hooks: bool,
    /// Remove the release from the store entirely.
    pub purge: bool,
    /// Seconds to wait for the operation.
    pub timeout: String,
    /// Enable TLS for the connection.
    pub tls: bool,
    /// TLS CA certificate path.
    pub tls_ca_cert: String,
    /// TLS certificate path.
    pub tls_cert: String,
    /// TLS key path.
    pub tls_key: String,
    /// Verify the remote certificate.
    pub tls_verify: bool,
}

/// Flags accepted by the rollback command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct RollbackFlags {
    /// Simulate the rollback.
    pub dry_run: bool,
    /// Force resource updates by delete/recreate.
    pub force: bool,
    /// Disable pre/post hooks.
    pub no_hooks: bool,
    /// Recreate pods for the release.
    pub recreate_pods: bool,
    /// Seconds to wait for the operation.
    pub timeout: String,
    /// Enable TLS for the connection.
    pub tls: bool,
    /// TLS CA certificate path.
    pub tls_ca_cert: String,
    /// TLS certificate path.
    pub tls_cert: String,
    /// TLS key path.
    pub tls_key: String,
    /// Verify the remote certificate.
    pub tls_verify: bool,
    /// Wait for resources to become ready.
    pub wait: bool,
}

// Flag emission helpers. A boolean flag is emitted bare when true; a string
// flag is emitted with its value when non-empty; a list flag repeats the
// switch once per non-empty element.

fn push_bool(args: &mut Vec<String>, flag: &str, value: bool) {
    if value {
        args.push(format!("--{flag}"));
    }
}

fn push_string(args: &mut Vec<String>, flag: &str, value: &str) {
    if !value.is_empty() {
        args.push(format!("--{flag}"));
        args.push(value.to_string());
    }
}

fn push_list(args: &mut Vec<String>, flag: &str, values: &[String]) {
    for value in values {
        if !value.is_empty() {
            args.push(format!("--{flag}"));
            args.push(value.clone());
        }
    }
}

impl InstallFlags {
    /// Renders the flag set as command arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        push_string(&mut args, "ca-file", &self.ca_file);
        push_string(&mut args, "cert-file", &self.cert_file);
        push_string(&mut args, "devel", &self.devel);
        push_bool(&mut args, "dry-run", self.dry_run);
        push_string(&mut args, "key-file", &self.key_file);
        push_string(&mut args, "keyring", &self.keyring);
        push_string(&mut args, "name", &self.name);
        push_string(&mut args, "name-template", &self.name_template);
        push_string(&mut args, "namespace", &self.namespace);
        push_bool(&mut args, "no-hooks", self.no_hooks);
        push_bool(&mut args, "replace", self.replace);
        push_string(&mut args, "repo", &self.repo);
        push_list(&mut args, "set", &self.set);
        push_string(&mut args, "timeout", &self.timeout);
        push_bool(&mut args, "tls", self.tls);
        push_string(&mut args, "tls-ca-cert", &self.tls_ca_cert);
        push_string(&mut args, "tls-cert", &self.tls_cert);
        push_string(&mut args, "tls-key", &self.tls_key);
        push_bool(&mut args, "tls-verify", self.tls_verify);
        push_list(&mut args, "values", &self.values);
        push_bool(&mut args, "verify", self.verify);
        push_string(&mut args, "version", &self.version);
        push_bool(&mut args, "wait", self.wait);
        args
    }
}

impl UpgradeFlags {
    /// Renders the flag set as command arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        push_string(&mut args, "ca-file", &self.ca_file);
        push_string(&mut args, "cert-file", &self.cert_file);
        push_string(&mut args, "devel", &self.devel);
        push_bool(&mut args, "dry-run", self.dry_run);
        push_bool(&mut args, "force", self.force);
        push_bool(&mut args, "install", self.install);
        push_string(&mut args, "key-file", &self.key_file);
        push_string(&mut args, "keyring", &self.keyring);
        push_string(&mut args, "namespace", &self.namespace);
        push_bool(&mut args, "no-hooks", self.no_hooks);
        push_bool(&mut args, "recreate-pods", self.recreate_pods);
        push_string(&mut args, "repo", &self.repo);
        push_bool(&mut args, "reset-values", self.reset_values);
        push_bool(&mut args, "reuse-values", self.reuse_values);
        push_list(&mut args, "set", &self.set);
        push_string(&mut args, "timeout", &self.timeout);
        push_bool(&mut args, "tls", self.tls);
        push_string(&mut args, "tls-ca-cert", &self.tls_ca_cert);
        push_string(&mut args, "tls-cert", &self.tls_cert);
        push_string(&mut args, "tls-key", &self.tls_key);
        push_bool(&mut args, "tls-verify", self.tls_verify);
        push_list(&mut args, "values", &self.values);
        push_bool(&mut args, "verify", self.verify);
        push_string(&mut args, "version", &self.version);
        push_bool(&mut args, "wait", self.wait);
        args
    }
}

impl DeleteFlags {
    /// Renders the flag set as command arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        push_bool(&mut args, "dry-run", self.dry_run);
        push_bool(&mut args, "no-hooks", self.no_hooks);
        push_bool(&mut args, "purge", self.purge);
        push_string(&mut args, "timeout", &self.timeout);
        push_bool(&mut args, "tls", self.tls);
        push_string(&mut args, "tls-ca-cert", &self.tls_ca_cert);
        push_string(&mut args, "tls-cert", &self.tls_cert);
        push_string(&mut args, "tls-key", &self.tls_key);
        push_bool(&mut args, "tls-verify", self.tls_verify);
        args
    }
}

impl RollbackFlags {
    /// Renders the flag set as command arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        push_bool(&mut args, "dry-run", self.dry_run);
        push_bool(&mut args, "force", self.force);
        push_bool(&mut args, "no-hooks", self.no_hooks);
        push_bool(&mut args, "recreate-pods", self.recreate_pods);
        push_string(&mut args, "timeout", &self.timeout);
        push_bool(&mut args, "tls", self.tls);
        push_string(&mut args, "tls-ca-cert", &self.tls_ca_cert);
        push_string(&mut args, "tls-cert", &self.tls_cert);
        push_string(&mut args, "tls-key", &self.tls_key);
        push_bool(&mut args, "tls-verify", self.tls_verify);
        push_bool(&mut args, "wait", self.wait);
        args
    }
}

impl ReleaseSpec {
    /// Creates a spec for the given chart with default flags.
    #[must_use]
    pub fn new(chart: impl Into<String>) -> Self {
        Self {
            chart: chart.into(),
            ..Self::default()
        }
    }

    /// Returns the release name (empty before conforming).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the release namespace (empty before conforming).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the specified chart version (empty means unpinned).
    #[must_use]
    pub fn version(&self) -> &str {
        &self.flags.install.version
    }

    /// Stamps the namespace and name onto the spec and its flag sets.
    pub fn conform(&mut self, namespace: &str, name: &str) {
        self.name = name.to_string();
        self.namespace = namespace.to_string();

        self.flags.install.name = name.to_string();
        self.flags.install.namespace = namespace.to_string();
        self.flags.upgrade.namespace = namespace.to_string();
    }

    /// Builds the install argument vector: flags, then the chart.
    #[must_use]
    pub fn install_args(&self) -> Vec<String> {
        let mut args = self.flags.install.to_args();
        args.push(self.chart.clone());
        args
    }

    /// Builds the upgrade argument vector: flags, then name and chart.
    #[must_use]
    pub fn upgrade_args(&self) -> Vec<String> {
        let mut args = self.flags.upgrade.to_args();
        args.push(self.name.clone());
        args.push(self.chart.clone());
        args
    }

    /// Builds the rollback argument vector: flags, then name and revision.
    #[must_use]
    pub fn rollback_args(&self, revision: u32) -> Vec<String> {
        let mut args = self.flags.rollback.to_args();
        args.push(self.name.clone());
        args.push(revision.to_string());
        args
    }

    /// Builds the delete argument vector: flags, then the name.
    #[must_use]
    pub fn delete_args(&self) -> Vec<String> {
        let mut args = self.flags.delete.to_args();
        args.push(self.name.clone());
        args
    }
}

impl fmt::Display for ReleaseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = self.version();
        if version.is_empty() {
            write!(f, "{}.{} chart: {}", self.namespace, self.name, self.chart)
        } else {
            write!(
                f,
                "{}.{} chart: {}-{}",
                self.namespace, self.name, self.chart, version
            )
        }
    }
}

impl Release {
    /// Returns the `namespace.name` key of this release.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.spec.namespace(), self.spec.name())
    }

    /// Returns the dependencies of this release, namespaced.
    #[must_use]
    pub fn qualified_deps(&self) -> Vec<String> {
        self.depends
            .iter()
            .map(|dep| format!("{}.{dep}", self.spec.namespace()))
            .collect()
    }
}

impl Plan {
    /// Stamps namespace and release names onto every contained spec.
    pub fn conform(&mut self) {
        for (namespace_name, namespace) in &mut self.namespaces {
            for (release_name, release) in namespace.iter_mut() {
                release.spec.conform(namespace_name, release_name);
            }
        }
    }

    /// Returns the total number of releases across all namespaces.
    #[must_use]
    pub fn release_count(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    /// Returns true if any eligible namespace specifies at least one release.
    ///
    /// An empty allow-list makes every namespace eligible.
    #[must_use]
    pub fn has_eligible_releases(&self, namespaces: &[String]) -> bool {
        self.namespaces.iter().any(|(name, releases)| {
            (namespaces.is_empty() || namespaces.contains(name)) && !releases.is_empty()
        })
    }
}
