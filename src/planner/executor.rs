//! Sequential executor with best-effort rollback.
//!
//! Operations are applied strictly in resolved order, one at a time. The
//! undo half of every operation that succeeded is pushed onto a LIFO stack
//! owned by the `execute` call; when a forward command fails, the remaining
//! plan is abandoned and the stack is unwound most-recently-succeeded first.
//! Undo attempts are independent of each other: a failing undo is logged and
//! counted, but never stops the remaining undo attempts and never overrides
//! the original failure returned to the caller.

use std::fmt;
use std::io::Write;
use tracing::{error, info};

use crate::error::Result;
use crate::helm::ReleaseManager;

use super::ops::{Operation, UndoableOperation};

/// Executor for an ordered list of undoable operations.
#[derive(Debug)]
pub struct PlanExecutor<'a, M: ReleaseManager> {
    /// Release manager performing the actual commands.
    manager: &'a M,
    /// When set, describe operations without executing anything.
    dry_run: bool,
}

/// Terminal status of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// Never started (dry-run, or abandoned after an earlier failure).
    Pending,
    /// The forward command completed successfully.
    Succeeded,
    /// The forward command failed; rollback was triggered.
    Failed,
}

/// Outcome of one operation.
#[derive(Debug, Clone)]
pub struct OperationOutcome {
    /// Description of the forward command.
    pub description: String,
    /// Terminal status.
    pub status: OperationStatus,
}

/// Result of executing an operation list to completion.
#[derive(Debug)]
pub struct ExecutionReport {
    /// Per-operation outcomes, in execution order.
    pub outcomes: Vec<OperationOutcome>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl<'a, M: ReleaseManager> PlanExecutor<'a, M> {
    /// Creates a new executor.
    #[must_use]
    pub const fn new(manager: &'a M) -> Self {
        Self {
            manager,
            dry_run: false,
        }
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Applies the operations in order.
    ///
    /// In dry-run mode, descriptions are emitted but no command runs and
    /// nothing is pushed onto the undo stack.
    ///
    /// # Errors
    ///
    /// Returns the original forward-command failure after rollback has been
    /// attempted, regardless of whether any undo attempts also failed.
    pub fn execute(
        &self,
        operations: &[UndoableOperation],
        sink: &mut dyn Write,
    ) -> Result<ExecutionReport> {
        let mut outcomes = Vec::with_capacity(operations.len());
        let mut undo_stack: Vec<&Operation> = Vec::new();

        for operation in operations {
            if self.dry_run {
                info!("(dry-run) {}", operation.run.description);
                outcomes.push(OperationOutcome {
                    description: operation.run.description.clone(),
                    status: OperationStatus::Pending,
                });
                continue;
            }

            info!("{}", operation.run.description);
            match self
                .manager
                .run(operation.run.kind, &operation.run.args, sink)
            {
                Ok(()) => {
                    undo_stack.push(&operation.undo);
                    outcomes.push(OperationOutcome {
                        description: operation.run.description.clone(),
                        status: OperationStatus::Succeeded,
                    });
                }
                Err(err) => {
                    error!("Operation failed: {err}");
                    outcomes.push(OperationOutcome {
                        description: operation.run.description.clone(),
                        status: OperationStatus::Failed,
                    });
                    self.unwind(&undo_stack, sink);
                    return Err(err);
                }
            }
        }

        Ok(ExecutionReport {
            outcomes,
            dry_run: self.dry_run,
        })
    }

    /// Runs every undo on the stack, most-recently-succeeded first.
    fn unwind(&self, undo_stack: &[&Operation], sink: &mut dyn Write) {
        if undo_stack.is_empty() {
            return;
        }

        info!("Undoing {} completed operation(s)", undo_stack.len());
        for undo in undo_stack.iter().rev() {
            info!("{}", undo.description);
            if let Err(err) = self.manager.run(undo.kind, &undo.args, sink) {
                error!("Undo failed for `{}`: {err}", undo.description);
            }
        }
    }
}

impl ExecutionReport {
    /// Returns the number of operations that completed successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OperationStatus::Succeeded)
            .count()
    }

    /// Returns the total number of operations covered by the report.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.outcomes.len()
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            write!(f, "Dry run: {} operation(s) described", self.total())
        } else {
            write!(
                f,
                "Applied {} of {} operation(s)",
                self.succeeded(),
                self.total()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FlotillaError, HelmError};
    use crate::helm::{CommandKind, DeployedRelease};
    use std::cell::RefCell;

    /// Records every command and fails those matching a marker.
    struct RecordingManager {
        calls: RefCell<Vec<String>>,
        fail_matching: Vec<String>,
    }

    impl RecordingManager {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_matching: Vec::new(),
            }
        }

        fn failing_on(markers: &[&str]) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_matching: markers.iter().map(ToString::to_string).collect(),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl ReleaseManager for RecordingManager {
        fn list(&self) -> Result<Vec<DeployedRelease>> {
            Ok(Vec::new())
        }

        fn run(
            &self,
            kind: CommandKind,
            args: &[String],
            _sink: &mut dyn Write,
        ) -> Result<()> {
            let rendered = format!("{kind} {}", args.join(" "));
            self.calls.borrow_mut().push(rendered.clone());

            if self.fail_matching.iter().any(|m| rendered.contains(m)) {
                return Err(FlotillaError::Helm(HelmError::CommandFailed {
                    command: rendered,
                    status: 1,
                }));
            }
            Ok(())
        }
    }

    fn install_op(name: &str) -> UndoableOperation {
        UndoableOperation {
            run: Operation {
                description: format!("Install {name}"),
                kind: CommandKind::Install,
                args: vec![name.to_string()],
            },
            undo: Operation {
                description: format!("Delete {name}"),
                kind: CommandKind::Delete,
                args: vec![name.to_string()],
            },
        }
    }

    #[test]
    fn test_all_operations_apply_in_order() {
        let manager = RecordingManager::new();
        let ops = vec![install_op("one"), install_op("two")];

        let report = PlanExecutor::new(&manager)
            .execute(&ops, &mut std::io::sink())
            .unwrap();

        assert_eq!(report.succeeded(), 2);
        assert_eq!(manager.calls(), vec!["install one", "install two"]);
    }

    #[test]
    fn test_failure_rolls_back_in_reverse_order() {
        let manager = RecordingManager::failing_on(&["install three"]);
        let ops = vec![install_op("one"), install_op("two"), install_op("three")];

        let result = PlanExecutor::new(&manager).execute(&ops, &mut std::io::sink());

        // The original failure is returned, after rollback.
        match result {
            Err(FlotillaError::Helm(HelmError::CommandFailed { command, .. })) => {
                assert_eq!(command, "install three");
            }
            other => panic!("expected the failing install's error, got {other:?}"),
        }
        assert_eq!(
            manager.calls(),
            vec![
                "install one",
                "install two",
                "install three",
                "delete two",
                "delete one",
            ]
        );
    }

    #[test]
    fn test_undo_failure_does_not_stop_rollback() {
        let manager = RecordingManager::failing_on(&["install three", "delete two"]);
        let ops = vec![install_op("one"), install_op("two"), install_op("three")];

        let result = PlanExecutor::new(&manager).execute(&ops, &mut std::io::sink());

        // Still the original error, and the earlier undo is still attempted.
        match result {
            Err(FlotillaError::Helm(HelmError::CommandFailed { command, .. })) => {
                assert_eq!(command, "install three");
            }
            other => panic!("expected the failing install's error, got {other:?}"),
        }
        assert_eq!(
            manager.calls(),
            vec![
                "install one",
                "install two",
                "install three",
                "delete two",
                "delete one",
            ]
        );
    }

    #[test]
    fn test_dry_run_executes_nothing() {
        let manager = RecordingManager::failing_on(&["install"]);
        let ops = vec![install_op("one"), install_op("two")];

        let report = PlanExecutor::new(&manager)
            .with_dry_run(true)
            .execute(&ops, &mut std::io::sink())
            .unwrap();

        assert!(manager.calls().is_empty());
        assert!(report.dry_run);
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.status == OperationStatus::Pending));
    }

    #[test]
    fn test_first_operation_failure_has_nothing_to_undo() {
        let manager = RecordingManager::failing_on(&["install one"]);
        let ops = vec![install_op("one"), install_op("two")];

        let result = PlanExecutor::new(&manager).execute(&ops, &mut std::io::sink());

        assert!(result.is_err());
        assert_eq!(manager.calls(), vec!["install one"]);
    }

    #[test]
    fn test_empty_plan_succeeds() {
        let manager = RecordingManager::new();
        let report = PlanExecutor::new(&manager)
            .execute(&[], &mut std::io::sink())
            .unwrap();
        assert_eq!(report.total(), 0);
    }
}
