// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for topology validation.
//!
//! This module contains message types for logging events related to:
//! * Structural problems found while building a topology
//! * Successful validation of a topology

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// One problem found while validating a topology.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use metadata_ingestion::errors::ValidationError;
/// use metadata_ingestion::observability::messages::validation::TopologyValidationFailed;
///
/// let error = ValidationError::UnreachableNode { node: "orphan".to_string() };
/// let msg = TopologyValidationFailed { root: "root", error: &error };
///
/// tracing::error!("{}", msg);
/// ```
pub struct TopologyValidationFailed<'a> {
    pub root: &'a str,
    pub error: &'a ValidationError,
}

impl Display for TopologyValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Topology rooted at '{}' is invalid: {}", self.root, self.error)
    }
}

impl StructuredLog for TopologyValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            root = self.root,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "topology_validation",
            span_name = name,
            root = self.root,
            error = %self.error,
        )
    }
}

/// Topology passed every structural check.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct TopologyValidated<'a> {
    pub root: &'a str,
    pub node_count: usize,
    pub stage_count: usize,
}

impl Display for TopologyValidated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Topology rooted at '{}' is valid ({} nodes, {} stages)",
            self.root, self.node_count, self.stage_count
        )
    }
}

impl StructuredLog for TopologyValidated<'_> {
    fn log(&self) {
        tracing::debug!(
            root = self.root,
            node_count = self.node_count,
            stage_count = self.stage_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "topology_validation",
            span_name = name,
            root = self.root,
            node_count = self.node_count,
            stage_count = self.stage_count,
        )
    }
}
