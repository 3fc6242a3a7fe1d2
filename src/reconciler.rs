//! Reconciler tying the pipeline together.
//!
//! One [`Reconciler`] instance is created per invocation and owns every
//! piece of session state, including the executor and its undo stack; there
//! is no process-wide mutable state anywhere. The pipeline is:
//!
//! plan + deployed state → diff → dependency order → undoable operations →
//! sequential execution with rollback.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use tracing::{debug, info};

use crate::error::Result;
use crate::helm::ReleaseManager;
use crate::plan::Plan;
use crate::planner::{
    DependencyNode, DiffEngine, DiffResult, OperationBuilder, PlanExecutor, UndoableOperation,
    resolve,
};

/// Session object reconciling one plan against one environment.
#[derive(Debug)]
pub struct Reconciler<'a, M: ReleaseManager> {
    /// The conformed, validated plan.
    plan: &'a Plan,
    /// Release manager for observation and mutation.
    manager: &'a M,
    /// Namespace allow-list; empty means all namespaces.
    namespaces: Vec<String>,
    /// When set, describe operations without executing anything.
    dry_run: bool,
}

/// The ordered operations a reconciliation would apply, plus the diff that
/// produced them.
#[derive(Debug)]
pub struct ReconcilePlan {
    /// Undoable operations in dependency order.
    pub operations: Vec<UndoableOperation>,
    /// The underlying diff result.
    pub diff: DiffResult,
}

/// Summary of a completed reconciliation.
#[derive(Debug, serde::Serialize)]
pub struct ReconcileSummary {
    /// Number of releases installed.
    pub installed: usize,
    /// Number of releases upgraded.
    pub upgraded: usize,
    /// Number of releases already converged.
    pub unchanged: usize,
    /// Deployed-but-unspecified releases, reported but untouched.
    pub unmanaged: Vec<String>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl<'a, M: ReleaseManager> Reconciler<'a, M> {
    /// Creates a new reconciler for one plan and one release manager.
    #[must_use]
    pub const fn new(plan: &'a Plan, manager: &'a M) -> Self {
        Self {
            plan,
            manager,
            namespaces: Vec::new(),
            dry_run: false,
        }
    }

    /// Restricts reconciliation to the given namespaces (empty means all).
    #[must_use]
    pub fn with_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Computes the ordered operation set without executing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployed-release query fails, a version
    /// cannot be parsed, or the dependency graph contains a cycle. All of
    /// these abort before any command is built.
    pub fn plan_operations(&self) -> Result<ReconcilePlan> {
        if !self.plan.has_eligible_releases(&self.namespaces) {
            info!("Nothing to do: the plan specifies no eligible releases");
            return Ok(ReconcilePlan {
                operations: Vec::new(),
                diff: DiffResult::default(),
            });
        }

        let deployed = self.manager.list()?;
        debug!("Found {} deployed release(s)", deployed.len());

        let diff = DiffEngine::new()
            .with_namespaces(&self.namespaces)
            .compute(self.plan, &deployed)?;

        info!(
            "Diff: {} to install, {} to upgrade, {} unchanged, {} unmanaged",
            diff.installs(),
            diff.upgrades(),
            diff.unchanged.len(),
            diff.unmanaged.len()
        );

        if !diff.has_changes() {
            return Ok(ReconcilePlan {
                operations: Vec::new(),
                diff,
            });
        }

        info!("Resolving dependencies");
        let nodes: Vec<DependencyNode> = diff
            .scheduled
            .iter()
            .map(|scheduled| DependencyNode {
                name: scheduled.key.clone(),
                deps: scheduled.release.qualified_deps(),
            })
            .collect();
        let order = resolve(nodes)?;

        let mut by_key: BTreeMap<String, _> = diff
            .scheduled
            .iter()
            .map(|scheduled| (scheduled.key.clone(), scheduled))
            .collect();

        let mut operations = Vec::with_capacity(order.len());
        for key in &order {
            if let Some(scheduled) = by_key.remove(key) {
                operations.push(OperationBuilder::build(scheduled));
            }
        }

        Ok(ReconcilePlan { operations, diff })
    }

    /// Runs the full reconciliation, applying the computed operations.
    ///
    /// Command output is forwarded to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if planning fails, or with the original operation
    /// failure after rollback has been attempted.
    pub fn reconcile(&self, sink: &mut dyn Write) -> Result<ReconcileSummary> {
        let reconcile_plan = self.plan_operations()?;

        let executor = PlanExecutor::new(self.manager).with_dry_run(self.dry_run);
        let report = executor.execute(&reconcile_plan.operations, sink)?;
        debug!("{report}");

        let diff = &reconcile_plan.diff;
        Ok(ReconcileSummary {
            installed: diff.installs(),
            upgraded: diff.upgrades(),
            unchanged: diff.unchanged.len(),
            unmanaged: diff
                .unmanaged
                .iter()
                .map(crate::helm::DeployedRelease::qualified_name)
                .collect(),
            dry_run: self.dry_run,
        })
    }
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heading = if self.dry_run {
            "Reconciliation (dry run):"
        } else {
            "Reconciliation complete:"
        };
        writeln!(f, "{heading}")?;
        writeln!(f, "  Installed: {}", self.installed)?;
        writeln!(f, "  Upgraded: {}", self.upgraded)?;
        writeln!(f, "  Unchanged: {}", self.unchanged)?;

        if !self.unmanaged.is_empty() {
            writeln!(f, "  Deployed but not in the plan:")?;
            for name in &self.unmanaged {
                writeln!(f, "    - {name}")?;
            }
        }

        Ok(())
    }
}
