//! Undoable operation construction.
//!
//! Maps every scheduled release to a forward lifecycle command paired with
//! its compensating command:
//!
//! - install → undone by delete
//! - upgrade → undone by a rollback to the previous revision, or by delete
//!   when the deployed revision is 1 (there is no earlier revision)

use std::fmt;

use crate::helm::CommandKind;

use super::diff::{ScheduledAction, ScheduledRelease};

/// One lifecycle command with a human-readable description.
#[derive(Debug, Clone)]
pub struct Operation {
    /// What this operation does, for display and logs.
    pub description: String,
    /// Lifecycle command kind.
    pub kind: CommandKind,
    /// Argument vector passed to the release manager.
    pub args: Vec<String>,
}

/// A forward operation paired with its compensating operation.
#[derive(Debug, Clone)]
pub struct UndoableOperation {
    /// The forward command.
    pub run: Operation,
    /// The compensating command, executed during rollback.
    pub undo: Operation,
}

/// Builder mapping scheduled releases to undoable operations.
#[derive(Debug, Default)]
pub struct OperationBuilder;

impl OperationBuilder {
    /// Builds the undoable operation for one scheduled release.
    #[must_use]
    pub fn build(scheduled: &ScheduledRelease) -> UndoableOperation {
        let spec = &scheduled.release.spec;

        match &scheduled.action {
            ScheduledAction::Install => UndoableOperation {
                run: Operation {
                    description: format!("Install {spec}"),
                    kind: CommandKind::Install,
                    args: spec.install_args(),
                },
                undo: Operation {
                    description: format!("Delete {spec}"),
                    kind: CommandKind::Delete,
                    args: spec.delete_args(),
                },
            },
            ScheduledAction::Upgrade { deployed } => {
                let undo = if deployed.revision > 1 {
                    let target = deployed.revision - 1;
                    Operation {
                        description: format!("Roll back {spec} to revision {target}"),
                        kind: CommandKind::Rollback,
                        args: spec.rollback_args(target),
                    }
                } else {
                    // Revision 1 has nothing to roll back to.
                    Operation {
                        description: format!("Delete {spec}"),
                        kind: CommandKind::Delete,
                        args: spec.delete_args(),
                    }
                };

                UndoableOperation {
                    run: Operation {
                        description: format!("Upgrade {spec}"),
                        kind: CommandKind::Upgrade,
                        args: spec.upgrade_args(),
                    },
                    undo,
                }
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "helm {}", self.kind)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helm::DeployedRelease;
    use crate::plan::{Release, ReleaseSpec};

    fn scheduled(action: ScheduledAction) -> ScheduledRelease {
        let mut spec = ReleaseSpec::new("charts/api");
        spec.flags.install.version = String::from("2.1.3");
        spec.conform("apps", "api");

        ScheduledRelease {
            key: String::from("apps.api"),
            release: Release {
                spec,
                depends: Vec::new(),
            },
            action,
        }
    }

    fn deployed_at_revision(revision: u32) -> DeployedRelease {
        DeployedRelease {
            namespace: String::from("apps"),
            name: String::from("api"),
            chart: String::from("api-2.0.0"),
            revision,
        }
    }

    #[test]
    fn test_install_is_undone_by_delete() {
        let op = OperationBuilder::build(&scheduled(ScheduledAction::Install));

        assert_eq!(op.run.kind, CommandKind::Install);
        assert_eq!(op.run.args.last().map(String::as_str), Some("charts/api"));
        assert_eq!(op.undo.kind, CommandKind::Delete);
        assert_eq!(op.undo.args, vec!["api"]);
    }

    #[test]
    fn test_upgrade_at_revision_one_is_undone_by_delete() {
        let op = OperationBuilder::build(&scheduled(ScheduledAction::Upgrade {
            deployed: deployed_at_revision(1),
        }));

        assert_eq!(op.run.kind, CommandKind::Upgrade);
        assert_eq!(op.undo.kind, CommandKind::Delete);
    }

    #[test]
    fn test_upgrade_is_undone_by_rollback_to_previous_revision() {
        let op = OperationBuilder::build(&scheduled(ScheduledAction::Upgrade {
            deployed: deployed_at_revision(5),
        }));

        assert_eq!(op.undo.kind, CommandKind::Rollback);
        assert_eq!(op.undo.args, vec!["api", "4"]);
    }

    #[test]
    fn test_operation_renders_as_command_line() {
        let op = Operation {
            description: String::from("Install something"),
            kind: CommandKind::Install,
            args: vec![String::from("--name"), String::from("foo"), String::from("foo/bar")],
        };
        assert_eq!(op.to_string(), "helm install --name foo foo/bar");
    }
}
