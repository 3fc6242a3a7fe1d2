//! Dependency graph resolution.
//!
//! Produces a total order consistent with the declared dependency partial
//! order, or fails with the unresolved subgraph when a cycle exists. The
//! algorithm iteratively removes nodes whose dependency sets are empty;
//! within one round, nodes resolve in lexicographic name order so the output
//! is fully deterministic.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::{FlotillaError, GraphError, Result};

/// A node in the dependency graph.
///
/// Transient: built from the scheduled releases just for resolution, with
/// `name = namespace.release` and dependencies qualified the same way.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    /// Qualified node name.
    pub name: String,
    /// Qualified names of the nodes this one depends on.
    pub deps: Vec<String>,
}

/// Resolves the nodes into a dependency-consistent total order of names.
///
/// Dependencies naming nodes outside the set are treated as already
/// satisfied: the release they refer to is either converged or not
/// scheduled, so it cannot block this round of operations.
///
/// # Errors
///
/// Returns [`GraphError::CircularDependency`] carrying the names of the
/// unresolved subgraph if the nodes cannot be totally ordered.
pub fn resolve(nodes: Vec<DependencyNode>) -> Result<Vec<String>> {
    let known: BTreeSet<String> = nodes.iter().map(|n| n.name.clone()).collect();

    // Node name -> still-unresolved dependency set.
    let mut pending: BTreeMap<String, BTreeSet<String>> = nodes
        .into_iter()
        .map(|node| {
            let deps: BTreeSet<String> = node
                .deps
                .into_iter()
                .filter(|dep| {
                    if known.contains(dep) {
                        true
                    } else {
                        debug!(
                            "Dependency {dep} of {} is not scheduled; treating as satisfied",
                            node.name
                        );
                        false
                    }
                })
                .collect();
            (node.name, deps)
        })
        .collect();

    let mut resolved = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        // Nodes whose dependency sets drained are ready; BTreeMap iteration
        // yields them in lexicographic order.
        let ready: Vec<String> = pending
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(name, _)| name.clone())
            .collect();

        if ready.is_empty() {
            let remaining: Vec<String> = pending.into_keys().collect();
            return Err(FlotillaError::Graph(GraphError::CircularDependency {
                nodes: remaining,
            }));
        }

        for name in &ready {
            pending.remove(name);
            resolved.push(name.clone());
        }

        for deps in pending.values_mut() {
            for name in &ready {
                deps.remove(name);
            }
        }
    }

    Ok(resolved)
}
