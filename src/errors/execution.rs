// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::models::StackTraceError;
use crate::topology::ContextKey;
use thiserror::Error;

/// Errors raised while walking a topology.
///
/// `ContextNotPopulated` is normally turned into a per-record failure by the
/// processor that hit it; `NodeNotFound` is fatal and aborts the walk.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("Context key '{key}' has not been populated yet")]
    ContextNotPopulated { key: ContextKey },

    #[error("Topology node '{node}' not found")]
    NodeNotFound { node: String },
}

impl From<ExecutionError> for StackTraceError {
    fn from(error: ExecutionError) -> Self {
        let name = match &error {
            ExecutionError::ContextNotPopulated { key } => key.to_string(),
            ExecutionError::NodeNotFound { node } => node.clone(),
        };
        StackTraceError::new(name, error.to_string())
    }
}
