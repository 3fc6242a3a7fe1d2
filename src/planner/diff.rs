//! Diff engine for comparing specified vs. deployed releases.
//!
//! The engine builds the specified and deployed key sets (`namespace.name`),
//! classifies every specified release as install, upgrade, or no-op, and
//! recognizes deployed releases that the plan no longer mentions. Upgrades
//! are decided by an exact-match semantic-version comparison and carry the
//! deployed metadata needed later for rollback target selection.

use semver::{Version, VersionReq};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{FlotillaError, ReconcileError, Result};
use crate::helm::DeployedRelease;
use crate::plan::{Plan, Release};

/// Classification assigned to a release during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The release is specified but not deployed.
    Install,
    /// The release is deployed at a different version than specified.
    Upgrade,
    /// The release is deployed but no longer specified.
    ///
    /// Recognized for reporting only; such releases are never acted upon.
    Delete,
    /// The release is deployed at exactly the specified version.
    NoOp,
}

/// A release scheduled for an operation, with any bound deployed metadata.
#[derive(Debug, Clone)]
pub struct ScheduledRelease {
    /// The `namespace.name` key.
    pub key: String,
    /// The release definition from the plan.
    pub release: Release,
    /// What to do, with upgrade metadata when applicable.
    pub action: ScheduledAction,
}

/// The operation a scheduled release requires.
#[derive(Debug, Clone)]
pub enum ScheduledAction {
    /// Install the release.
    Install,
    /// Upgrade the release; carries the deployed state it upgrades from.
    Upgrade {
        /// The currently deployed release this upgrade replaces.
        deployed: DeployedRelease,
    },
}

/// Complete diff result.
#[derive(Debug, Default)]
pub struct DiffResult {
    /// Releases requiring an operation, sorted by key.
    pub scheduled: Vec<ScheduledRelease>,
    /// Keys of releases already converged, sorted.
    pub unchanged: Vec<String>,
    /// Deployed releases the plan no longer specifies, sorted by key.
    pub unmanaged: Vec<DeployedRelease>,
}

/// Engine computing the diff between a plan and the deployed state.
#[derive(Debug, Default)]
pub struct DiffEngine {
    /// Namespace allow-list; empty means all namespaces are eligible.
    namespaces: Vec<String>,
}

impl ScheduledRelease {
    /// Returns the reporting classification of this release.
    #[must_use]
    pub const fn action(&self) -> Action {
        match self.action {
            ScheduledAction::Install => Action::Install,
            ScheduledAction::Upgrade { .. } => Action::Upgrade,
        }
    }
}

impl DiffEngine {
    /// Creates a new diff engine eligible for all namespaces.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            namespaces: Vec::new(),
        }
    }

    /// Restricts the engine to the given namespaces (empty means all).
    #[must_use]
    pub fn with_namespaces(mut self, namespaces: &[String]) -> Self {
        self.namespaces = namespaces.to_vec();
        self
    }

    /// Returns true if the namespace is eligible under the allow-list.
    fn is_eligible(&self, namespace: &str) -> bool {
        self.namespaces.is_empty() || self.namespaces.iter().any(|n| n == namespace)
    }

    /// Computes the diff between the plan and the deployed releases.
    ///
    /// # Errors
    ///
    /// Returns an error if a deployed or specified chart version cannot be
    /// parsed as a semantic version. No partial result is produced.
    pub fn compute(&self, plan: &Plan, deployed: &[DeployedRelease]) -> Result<DiffResult> {
        // Specified set S, keyed namespace.name.
        let mut specified: BTreeMap<String, &Release> = BTreeMap::new();
        for (namespace_name, namespace) in &plan.namespaces {
            if !self.is_eligible(namespace_name) {
                continue;
            }
            for (release_name, release) in namespace {
                specified.insert(format!("{namespace_name}.{release_name}"), release);
            }
        }

        if specified.is_empty() {
            info!("Nothing to do: the plan specifies no eligible releases");
            return Ok(DiffResult::default());
        }

        // Deployed set D, restricted to eligible namespaces the plan knows.
        let mut deployed_map: BTreeMap<String, &DeployedRelease> = BTreeMap::new();
        for release in deployed {
            if !self.is_eligible(&release.namespace) {
                continue;
            }
            if !plan.namespaces.contains_key(&release.namespace) {
                continue;
            }
            deployed_map.insert(release.qualified_name(), release);
        }

        let mut result = DiffResult::default();

        // S − D installs; S ∩ D upgrade candidates.
        for (key, release) in &specified {
            match deployed_map.get(key) {
                None => {
                    debug!("Release {key} is not deployed; scheduling install");
                    result.scheduled.push(ScheduledRelease {
                        key: key.clone(),
                        release: (*release).clone(),
                        action: ScheduledAction::Install,
                    });
                }
                Some(current) => {
                    if Self::needs_upgrade(key, release, current)? {
                        result.scheduled.push(ScheduledRelease {
                            key: key.clone(),
                            release: (*release).clone(),
                            action: ScheduledAction::Upgrade {
                                deployed: (*current).clone(),
                            },
                        });
                    } else {
                        debug!("Release {key} is already at the specified version");
                        result.unchanged.push(key.clone());
                    }
                }
            }
        }

        // D − S: recognized, reported, never acted upon.
        for (key, release) in &deployed_map {
            if !specified.contains_key(key) {
                warn!("Release {key} is deployed but not specified; leaving it untouched");
                result.unmanaged.push((*release).clone());
            }
        }

        Ok(result)
    }

    /// Decides whether a deployed release needs an upgrade.
    ///
    /// An unpinned specified version always upgrades (ensure-latest policy).
    /// Otherwise the deployed chart version must satisfy an exact-match
    /// constraint built from the specified version.
    fn needs_upgrade(key: &str, release: &Release, deployed: &DeployedRelease) -> Result<bool> {
        let specified_version = release.spec.version();
        if specified_version.is_empty() {
            debug!("Release {key} pins no version; scheduling refresh upgrade");
            return Ok(true);
        }

        let deployed_version = Version::parse(deployed.chart_version()).map_err(|e| {
            FlotillaError::Reconcile(ReconcileError::version_parse(
                key,
                deployed.chart_version(),
                e.to_string(),
            ))
        })?;

        let requirement = VersionReq::parse(&format!("={specified_version}")).map_err(|e| {
            FlotillaError::Reconcile(ReconcileError::version_parse(
                key,
                specified_version,
                e.to_string(),
            ))
        })?;

        Ok(!requirement.matches(&deployed_version))
    }
}

impl DiffResult {
    /// Returns the number of scheduled installs.
    #[must_use]
    pub fn installs(&self) -> usize {
        self.scheduled
            .iter()
            .filter(|s| s.action() == Action::Install)
            .count()
    }

    /// Returns the number of scheduled upgrades.
    #[must_use]
    pub fn upgrades(&self) -> usize {
        self.scheduled
            .iter()
            .filter(|s| s.action() == Action::Upgrade)
            .count()
    }

    /// Returns true if any operation is required.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        !self.scheduled.is_empty()
    }

    /// Returns every classification in the diff, sorted by release key:
    /// scheduled operations, converged releases, and unmanaged deployed
    /// releases.
    #[must_use]
    pub fn classifications(&self) -> Vec<(String, Action)> {
        let mut rows: Vec<(String, Action)> = self
            .scheduled
            .iter()
            .map(|s| (s.key.clone(), s.action()))
            .collect();
        rows.extend(self.unchanged.iter().map(|k| (k.clone(), Action::NoOp)));
        rows.extend(
            self.unmanaged
                .iter()
                .map(|r| (r.qualified_name(), Action::Delete)),
        );
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Install => "install",
            Self::Upgrade => "upgrade",
            Self::Delete => "delete",
            Self::NoOp => "no-op",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanParser;

    fn load(yaml: &str) -> Plan {
        PlanParser::new().parse_yaml(yaml, None).unwrap()
    }

    fn plan_two_releases() -> Plan {
        load(
            r#"
version: "1"
namespaces:
  apps:
    api:
      spec:
        chart: charts/api
        flags:
          install: {version: "2.1.3"}
    db:
      spec:
        chart: stable/postgresql
        flags:
          install: {version: "8.6.1"}
"#,
        )
    }

    fn deployed(namespace: &str, name: &str, chart: &str, revision: u32) -> DeployedRelease {
        DeployedRelease {
            namespace: namespace.to_string(),
            name: name.to_string(),
            chart: chart.to_string(),
            revision,
        }
    }

    #[test]
    fn test_install_is_specified_minus_deployed() {
        let plan = plan_two_releases();
        let result = DiffEngine::new().compute(&plan, &[]).unwrap();

        assert_eq!(result.installs(), 2);
        assert_eq!(result.upgrades(), 0);
        let keys: Vec<&str> = result.scheduled.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["apps.api", "apps.db"]);
    }

    #[test]
    fn test_equal_version_is_noop() {
        let plan = plan_two_releases();
        let current = vec![
            deployed("apps", "api", "api-2.1.3", 1),
            deployed("apps", "db", "postgresql-8.6.1", 2),
        ];
        let result = DiffEngine::new().compute(&plan, &current).unwrap();

        assert!(!result.has_changes());
        assert_eq!(result.unchanged, vec!["apps.api", "apps.db"]);
    }

    #[test]
    fn test_version_drift_is_upgrade_with_binding() {
        let plan = plan_two_releases();
        let current = vec![
            deployed("apps", "api", "api-2.0.0", 4),
            deployed("apps", "db", "postgresql-8.6.1", 1),
        ];
        let result = DiffEngine::new().compute(&plan, &current).unwrap();

        assert_eq!(result.upgrades(), 1);
        let upgrade = &result.scheduled[0];
        assert_eq!(upgrade.key, "apps.api");
        match &upgrade.action {
            ScheduledAction::Upgrade { deployed } => assert_eq!(deployed.revision, 4),
            ScheduledAction::Install => panic!("expected an upgrade"),
        }
    }

    #[test]
    fn test_unpinned_version_always_upgrades() {
        let plan = load(
            r#"
version: "1"
namespaces:
  apps:
    api:
      spec:
        chart: charts/api
"#,
        );
        let current = vec![deployed("apps", "api", "api-2.1.3", 2)];
        let result = DiffEngine::new().compute(&plan, &current).unwrap();
        assert_eq!(result.upgrades(), 1);
    }

    #[test]
    fn test_unparsable_deployed_version_aborts() {
        let plan = plan_two_releases();
        let current = vec![deployed("apps", "api", "api-canary", 2)];
        let result = DiffEngine::new().compute(&plan, &current);
        assert!(matches!(
            result,
            Err(FlotillaError::Reconcile(ReconcileError::VersionParse { .. }))
        ));
    }

    #[test]
    fn test_unmanaged_release_is_recognized_not_scheduled() {
        let plan = plan_two_releases();
        let current = vec![
            deployed("apps", "api", "api-2.1.3", 1),
            deployed("apps", "db", "postgresql-8.6.1", 1),
            deployed("apps", "legacy", "legacy-0.1.0", 7),
        ];
        let result = DiffEngine::new().compute(&plan, &current).unwrap();

        assert!(!result.has_changes());
        assert_eq!(result.unmanaged.len(), 1);
        assert_eq!(result.unmanaged[0].qualified_name(), "apps.legacy");
    }

    #[test]
    fn test_deployed_outside_plan_namespaces_is_ignored() {
        let plan = plan_two_releases();
        let current = vec![deployed("kube-system", "tiller", "tiller-0.1.0", 1)];
        let result = DiffEngine::new().compute(&plan, &current).unwrap();
        assert!(result.unmanaged.is_empty());
    }

    #[test]
    fn test_namespace_filter_limits_eligibility() {
        let plan = load(
            r#"
version: "1"
namespaces:
  infra:
    ingress:
      spec:
        chart: stable/nginx-ingress
        flags:
          install: {version: "1.6.0"}
  apps:
    api:
      spec:
        chart: charts/api
        flags:
          install: {version: "2.1.3"}
"#,
        );
        let filter = vec![String::from("infra")];
        let result = DiffEngine::new()
            .with_namespaces(&filter)
            .compute(&plan, &[])
            .unwrap();

        assert_eq!(result.installs(), 1);
        assert_eq!(result.scheduled[0].key, "infra.ingress");
    }

    #[test]
    fn test_empty_specified_set_is_explicit_noop() {
        let plan = load(
            r#"
version: "1"
namespaces: {}
"#,
        );
        let current = vec![deployed("apps", "api", "api-2.1.3", 1)];
        let result = DiffEngine::new().compute(&plan, &current).unwrap();

        assert!(!result.has_changes());
        assert!(result.unmanaged.is_empty());
        assert!(result.unchanged.is_empty());
    }

    #[test]
    fn test_classifications_cover_all_releases() {
        let plan = plan_two_releases();
        let current = vec![
            deployed("apps", "api", "api-2.0.0", 2),
            deployed("apps", "db", "postgresql-8.6.1", 1),
            deployed("apps", "legacy", "legacy-0.1.0", 1),
        ];
        let result = DiffEngine::new().compute(&plan, &current).unwrap();

        let rows = result.classifications();
        assert_eq!(
            rows,
            vec![
                (String::from("apps.api"), Action::Upgrade),
                (String::from("apps.db"), Action::NoOp),
                (String::from("apps.legacy"), Action::Delete),
            ]
        );
    }

    #[test]
    fn test_idempotent_when_converged() {
        let plan = plan_two_releases();
        let current = vec![
            deployed("apps", "api", "api-2.1.3", 3),
            deployed("apps", "db", "postgresql-8.6.1", 2),
        ];
        for _ in 0..2 {
            let result = DiffEngine::new().compute(&plan, &current).unwrap();
            assert_eq!(result.installs(), 0);
            assert_eq!(result.upgrades(), 0);
        }
    }
}
