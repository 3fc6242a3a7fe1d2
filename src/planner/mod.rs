//! Planning module for reconciliation operations.
//!
//! This module turns a plan and the observed deployed state into an ordered,
//! undoable operation list and applies it:
//! - diff: classify every release (install / upgrade / no-op / unmanaged)
//! - graph: order scheduled releases by their declared dependencies
//! - ops: pair each operation with its compensating command
//! - executor: apply sequentially, rolling back on failure

mod diff;
mod graph;
mod ops;
mod executor;

pub use diff::{Action, DiffEngine, DiffResult, ScheduledAction, ScheduledRelease};
pub use graph::{DependencyNode, resolve};
pub use ops::{Operation, OperationBuilder, UndoableOperation};
pub use executor::{ExecutionReport, OperationOutcome, OperationStatus, PlanExecutor};
