// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Flotilla
//!
//! Declarative multi-release deployment plans for Helm charts.
//!
//! ## Overview
//!
//! Flotilla reconciles a declarative plan of releases against the currently
//! deployed state of a cluster:
//!
//! - Diffs specified releases against deployed releases and classifies each
//!   one (install, upgrade, or nothing to do) using semantic versions
//! - Orders the required operations by declared inter-release dependencies
//! - Pairs every operation with its compensating command
//! - Applies the operations sequentially, rolling back completed work when
//!   an operation fails partway through
//!
//! ## Modules
//!
//! - [`plan`]: Plan document parsing, conforming, and validation
//! - [`planner`]: Diff computation, dependency ordering, operation
//!   construction, and execution
//! - [`helm`]: The release-manager seam and the Helm CLI implementation
//! - [`reconciler`]: The per-invocation session tying the pipeline together
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! version: "1"
//! namespaces:
//!   infra:
//!     ingress:
//!       spec:
//!         chart: stable/nginx-ingress
//!         flags:
//!           install:
//!             version: "1.6.0"
//!   apps:
//!     api:
//!       spec:
//!         chart: charts/api
//!         flags:
//!           install: {version: "2.1.3"}
//!           upgrade: {version: "2.1.3"}
//!       depends: [db]
//!     db:
//!       spec:
//!         chart: stable/postgresql
//!         flags:
//!           install: {version: "8.6.1"}
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod error;
pub mod helm;
pub mod plan;
pub mod planner;
pub mod reconciler;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use error::{FlotillaError, Result};
pub use helm::{CommandKind, DeployedRelease, HelmCli, ReleaseManager};
pub use plan::{Plan, PlanParser, PlanValidator};
pub use planner::{Action, DiffEngine, OperationBuilder, PlanExecutor, UndoableOperation};
pub use reconciler::{ReconcilePlan, ReconcileSummary, Reconciler};
