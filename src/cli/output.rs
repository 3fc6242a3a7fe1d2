//! Output formatting for CLI commands.
//!
//! Formats validation reports, operation plans, and reconciliation summaries
//! as human-readable text or JSON.

use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::plan::ValidationReport;
use crate::reconciler::{ReconcilePlan, ReconcileSummary};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Operation row for table display.
#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Undo")]
    undo: String,
}

/// JSON mirror of an operation plan.
#[derive(Serialize)]
struct PlanJson {
    operations: Vec<OperationJson>,
    classifications: BTreeMap<String, String>,
    unchanged: Vec<String>,
    unmanaged: Vec<String>,
}

/// JSON mirror of one undoable operation.
#[derive(Serialize)]
struct OperationJson {
    description: String,
    command: String,
    undo_description: String,
    undo_command: String,
}

/// JSON mirror of a validation report.
#[derive(Serialize)]
struct ValidationJson {
    valid: bool,
    warnings: Vec<String>,
}

impl From<&ReconcilePlan> for PlanJson {
    fn from(plan: &ReconcilePlan) -> Self {
        Self {
            operations: plan
                .operations
                .iter()
                .map(|op| OperationJson {
                    description: op.run.description.clone(),
                    command: op.run.to_string(),
                    undo_description: op.undo.description.clone(),
                    undo_command: op.undo.to_string(),
                })
                .collect(),
            classifications: plan
                .diff
                .classifications()
                .into_iter()
                .map(|(key, action)| (key, action.to_string()))
                .collect(),
            unchanged: plan.diff.unchanged.clone(),
            unmanaged: plan
                .diff
                .unmanaged
                .iter()
                .map(crate::helm::DeployedRelease::qualified_name)
                .collect(),
        }
    }
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats an operation plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &ReconcilePlan) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&PlanJson::from(plan)).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &ReconcilePlan) -> String {
        let mut output = String::new();

        if plan.operations.is_empty() {
            let _ = writeln!(
                output,
                "{} No changes required - deployed state matches the plan.",
                "OK".green()
            );
        } else {
            let rows: Vec<OperationRow> = plan
                .operations
                .iter()
                .enumerate()
                .map(|(i, op)| OperationRow {
                    index: i + 1,
                    operation: op.run.description.clone(),
                    undo: op.undo.description.clone(),
                })
                .collect();

            output.push_str(&Table::new(rows).to_string());
            output.push('\n');

            let _ = writeln!(
                output,
                "\nPlan: {} to install, {} to upgrade, {} unchanged",
                plan.diff.installs().to_string().green(),
                plan.diff.upgrades().to_string().yellow(),
                plan.diff.unchanged.len()
            );
        }

        if !plan.diff.unmanaged.is_empty() {
            let _ = writeln!(
                output,
                "\n{} deployed release(s) are not in the plan and will not be touched:",
                plan.diff.unmanaged.len().to_string().yellow()
            );
            for release in &plan.diff.unmanaged {
                let _ = writeln!(output, "  - {}", release.qualified_name());
            }
        }

        output
    }

    /// Formats a reconciliation summary for display.
    #[must_use]
    pub fn format_summary(&self, summary: &ReconcileSummary) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Text => summary.to_string(),
        }
    }

    /// Formats a validation report for display.
    #[must_use]
    pub fn format_validation(&self, report: &ValidationReport) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = ValidationJson {
                    valid: report.is_valid(),
                    warnings: report.warnings.clone(),
                };
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = writeln!(output, "{} Plan is valid.", "OK".green());
                if !report.warnings.is_empty() {
                    let _ = writeln!(output, "\nWarnings:");
                    for warning in &report.warnings {
                        let _ = writeln!(output, "  - {}", warning.yellow());
                    }
                }
                output
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::DiffResult;

    #[test]
    fn test_empty_plan_text() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let plan = ReconcilePlan {
            operations: Vec::new(),
            diff: DiffResult::default(),
        };
        let text = formatter.format_plan(&plan);
        assert!(text.contains("No changes required"));
    }

    #[test]
    fn test_empty_plan_json() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let plan = ReconcilePlan {
            operations: Vec::new(),
            diff: DiffResult::default(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&formatter.format_plan(&plan)).unwrap();
        assert!(json["operations"].as_array().unwrap().is_empty());
    }
}
