//! Plan loading.
//!
//! This module reads the plan YAML document, deserializes it, and conforms
//! the result (stamping namespace and release names onto the embedded specs)
//! so downstream components can rely on fully-qualified identities.

use crate::error::{FlotillaError, PlanError, Result};
use std::path::Path;
use tracing::{debug, info};

use super::spec::Plan;

/// Loader for plan documents.
#[derive(Debug, Default)]
pub struct PlanParser;

impl PlanParser {
    /// Creates a new plan parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads and conforms a plan from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Plan> {
        let path = path.as_ref();
        info!("Loading plan from: {}", path.display());

        if !path.exists() {
            return Err(FlotillaError::Plan(PlanError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            FlotillaError::Plan(PlanError::parse(
                format!("Failed to read file: {e}"),
                Some(path.display().to_string()),
            ))
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses and conforms a plan from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<Plan> {
        debug!("Parsing plan document");

        let mut plan: Plan = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            FlotillaError::Plan(PlanError::parse(format!("YAML parse error: {e}"), location))
        })?;

        plan.conform();

        debug!(
            "Parsed plan version '{}' with {} release(s)",
            plan.version,
            plan.release_count()
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_PLAN: &str = r#"
version: "1"
namespaces:
  infra:
    ingress:
      spec:
        chart: stable/nginx-ingress
        flags:
          install:
            version: "1.6.0"
"#;

    #[test]
    fn test_parse_minimal_plan() {
        let parser = PlanParser::new();
        let plan = parser.parse_yaml(MINIMAL_PLAN, None).unwrap();

        assert_eq!(plan.version, "1");
        assert_eq!(plan.release_count(), 1);

        let release = &plan.namespaces["infra"]["ingress"];
        assert_eq!(release.spec.chart, "stable/nginx-ingress");
        assert_eq!(release.spec.version(), "1.6.0");
        // Conformed identities are stamped during load.
        assert_eq!(release.spec.namespace(), "infra");
        assert_eq!(release.spec.name(), "ingress");
    }

    #[test]
    fn test_parse_plan_with_dependencies() {
        let yaml = r#"
version: "1"
namespaces:
  apps:
    api:
      spec:
        chart: charts/api
        flags:
          install: {version: "2.1.3"}
          upgrade: {version: "2.1.3", wait: true}
      depends: [db]
    db:
      spec:
        chart: stable/postgresql
"#;
        let parser = PlanParser::new();
        let plan = parser.parse_yaml(yaml, None).unwrap();

        let api = &plan.namespaces["apps"]["api"];
        assert_eq!(api.depends, vec!["db"]);
        assert!(api.spec.flags.upgrade.wait);
        assert_eq!(plan.release_count(), 2);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let parser = PlanParser::new();
        let result = parser.parse_yaml("version: [unclosed", None);
        assert!(matches!(
            result,
            Err(FlotillaError::Plan(PlanError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let parser = PlanParser::new();
        let result = parser.load_file("/nonexistent/plan.yaml");
        assert!(matches!(
            result,
            Err(FlotillaError::Plan(PlanError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_load_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL_PLAN.as_bytes()).unwrap();

        let parser = PlanParser::new();
        let plan = parser.load_file(file.path()).unwrap();
        assert_eq!(plan.release_count(), 1);
    }
}
