//! Plan document module.
//!
//! This module handles everything about the declarative plan document:
//! - Deserializing the plan YAML into typed release specs
//! - Conforming loaded specs with their namespace and release names
//! - Validating whole-document invariants before any processing

mod spec;
mod parser;
mod validator;

pub use spec::{
    DeleteFlags, InstallFlags, Namespace, OperationFlags, Plan, Release, ReleaseSpec,
    RollbackFlags, UpgradeFlags,
};
pub use parser::PlanParser;
pub use validator::{PlanValidator, ValidationReport};
