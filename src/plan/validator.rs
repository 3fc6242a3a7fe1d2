//! Plan validation.
//!
//! Validation runs once, after loading and before any processing. It checks
//! the invariants the rest of the pipeline depends on: release names unique
//! across the whole document, dependencies naming releases that exist, and a
//! non-empty version tag.

use crate::error::{FlotillaError, PlanError, Result};
use std::collections::BTreeMap;
use tracing::debug;

use super::spec::Plan;

/// Validator for plan documents.
#[derive(Debug, Default)]
pub struct PlanValidator;

/// Validation result containing all issues found.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Fatal validation errors, in document order.
    pub errors: Vec<PlanError>,
    /// Non-fatal issues worth surfacing.
    pub warnings: Vec<String>,
}

impl PlanValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a conformed plan.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found; the full report (including
    /// warnings) is only available when the plan is valid.
    pub fn validate(&self, plan: &Plan) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        Self::check_version(plan, &mut report);
        Self::check_unique_names(plan, &mut report);
        Self::check_dependencies(plan, &mut report);

        if report.errors.is_empty() {
            debug!(
                "Plan validation passed ({} warning(s))",
                report.warnings.len()
            );
            Ok(report)
        } else {
            Err(FlotillaError::Plan(report.errors.remove(0)))
        }
    }

    /// Checks that the plan carries a version tag.
    fn check_version(plan: &Plan, report: &mut ValidationReport) {
        if plan.version.trim().is_empty() {
            report.errors.push(PlanError::MissingVersion);
        }
    }

    /// Checks that release names are unique across all namespaces.
    fn check_unique_names(plan: &Plan, report: &mut ValidationReport) {
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();

        for (namespace_name, namespace) in &plan.namespaces {
            if namespace.is_empty() {
                report
                    .warnings
                    .push(format!("Namespace '{namespace_name}' declares no releases"));
            }
            for release_name in namespace.keys() {
                if let Some(first) = seen.get(release_name.as_str()) {
                    report.errors.push(PlanError::DuplicateRelease {
                        name: release_name.clone(),
                        first_namespace: (*first).to_string(),
                        second_namespace: namespace_name.clone(),
                    });
                } else {
                    seen.insert(release_name.as_str(), namespace_name.as_str());
                }
            }
        }
    }

    /// Checks that every dependency names a release in the same namespace.
    fn check_dependencies(plan: &Plan, report: &mut ValidationReport) {
        for (namespace_name, namespace) in &plan.namespaces {
            for (release_name, release) in namespace {
                for dep in &release.depends {
                    if !namespace.contains_key(dep) {
                        report.errors.push(PlanError::UnknownDependency {
                            namespace: namespace_name.clone(),
                            release: release_name.clone(),
                            dependency: dep.clone(),
                        });
                    }
                }
                if release.spec.version().is_empty() {
                    report.warnings.push(format!(
                        "Release '{namespace_name}.{release_name}' pins no version; \
                         it will be upgraded on every run"
                    ));
                }
            }
        }
    }
}

impl ValidationReport {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanParser;

    fn load(yaml: &str) -> Plan {
        PlanParser::new().parse_yaml(yaml, None).unwrap()
    }

    #[test]
    fn test_single_namespace_is_valid() {
        let plan = load(
            r#"
version: "1"
namespaces:
  foo:
    service:
      spec:
        chart: charts/service
        flags:
          install: {version: "1.0.0"}
"#,
        );
        let report = PlanValidator::new().validate(&plan).unwrap();
        assert!(report.is_valid());
    }

    #[test]
    fn test_duplicate_name_across_namespaces_is_invalid() {
        let plan = load(
            r#"
version: "1"
namespaces:
  foo:
    service:
      spec:
        chart: charts/service
  bar:
    service:
      spec:
        chart: charts/service
"#,
        );
        let result = PlanValidator::new().validate(&plan);
        assert!(matches!(
            result,
            Err(FlotillaError::Plan(PlanError::DuplicateRelease { ref name, .. }))
                if name == "service"
        ));
    }

    #[test]
    fn test_unknown_dependency_is_invalid() {
        let plan = load(
            r#"
version: "1"
namespaces:
  apps:
    api:
      spec:
        chart: charts/api
      depends: [db]
"#,
        );
        let result = PlanValidator::new().validate(&plan);
        assert!(matches!(
            result,
            Err(FlotillaError::Plan(PlanError::UnknownDependency { ref dependency, .. }))
                if dependency == "db"
        ));
    }

    #[test]
    fn test_dependency_in_same_namespace_is_valid() {
        let plan = load(
            r#"
version: "1"
namespaces:
  apps:
    api:
      spec:
        chart: charts/api
        flags:
          install: {version: "1.0.0"}
      depends: [db]
    db:
      spec:
        chart: stable/postgresql
        flags:
          install: {version: "8.6.1"}
"#,
        );
        assert!(PlanValidator::new().validate(&plan).is_ok());
    }

    #[test]
    fn test_empty_version_tag_is_invalid() {
        let plan = load(
            r#"
version: ""
namespaces: {}
"#,
        );
        let result = PlanValidator::new().validate(&plan);
        assert!(matches!(
            result,
            Err(FlotillaError::Plan(PlanError::MissingVersion))
        ));
    }

    #[test]
    fn test_unpinned_version_warns() {
        let plan = load(
            r#"
version: "1"
namespaces:
  foo:
    service:
      spec:
        chart: charts/service
"#,
        );
        let report = PlanValidator::new().validate(&plan).unwrap();
        assert_eq!(report.warning_count(), 1);
    }
}
