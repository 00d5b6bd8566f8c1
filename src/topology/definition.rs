// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{ExecutionError, ValidationError};
use crate::observability::messages::validation::{TopologyValidated, TopologyValidationFailed};
use crate::observability::messages::StructuredLog;
use crate::topology::node::TopologyNode;
use crate::topology::validation::validate_topology;
use std::collections::HashMap;

/// A validated, immutable topology for connectors of type `C`.
///
/// Construction goes through [`Topology::new`], so every `Topology` value is a
/// rooted DAG whose children resolve, whose context keys are unique and whose
/// consumers are satisfied.
pub struct Topology<C> {
    root: String,
    nodes: Vec<TopologyNode<C>>,
    index: HashMap<String, usize>,
}

impl<C> Topology<C> {
    pub fn new(
        root: impl Into<String>,
        nodes: Vec<TopologyNode<C>>,
    ) -> Result<Self, Vec<ValidationError>> {
        let root = root.into();
        if let Err(errors) = validate_topology(&root, &nodes) {
            for error in &errors {
                TopologyValidationFailed { root: &root, error }.log();
            }
            return Err(errors);
        }
        TopologyValidated {
            root: &root,
            node_count: nodes.len(),
            stage_count: nodes.iter().map(|node| node.stages.len()).sum(),
        }
        .log();

        let index = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.name.clone(), position))
            .collect();

        Ok(Self { root, nodes, index })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn node(&self, name: &str) -> Result<&TopologyNode<C>, ExecutionError> {
        self.index
            .get(name)
            .and_then(|&position| self.nodes.get(position))
            .ok_or_else(|| ExecutionError::NodeNotFound {
                node: name.to_string(),
            })
    }

    pub fn nodes(&self) -> &[TopologyNode<C>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<C> std::fmt::Debug for Topology<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topology")
            .field("root", &self.root)
            .field("nodes", &self.nodes)
            .finish()
    }
}
