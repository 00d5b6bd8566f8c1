// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::topology::ContextKey;
use thiserror::Error;

/// Errors found while validating a topology definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Two nodes share a name
    #[error("Duplicate topology node: '{node}'")]
    DuplicateNode { node: String },

    /// The declared root is not among the nodes
    #[error("Root node '{root}' is not declared")]
    MissingRoot { root: String },

    /// A node lists a child that is not declared
    #[error("Node '{node}' lists child '{missing_child}' which does not exist")]
    UnresolvedChild {
        node: String,
        missing_child: String,
    },

    /// The children relation loops back on itself
    #[error("Cyclic topology detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Declared but never visited from the root
    #[error("Node '{node}' is not reachable from the root")]
    UnreachableNode { node: String },

    /// Two stages write the same context key
    #[error("Context key '{key}' is written by both '{first}' and '{second}'")]
    DuplicateContextKey {
        key: ContextKey,
        first: String,
        second: String,
    },

    /// A stage consumes a key no earlier stage produces
    #[error("Stage '{node}.{processor}' consumes '{key}' which is not produced earlier in the traversal")]
    UnresolvedConsumer {
        node: String,
        processor: String,
        key: ContextKey,
    },
}
