// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fatal errors for the workflow driver.
//!
//! Anything in here stops the workflow before (or instead of) walking the
//! topology. Per-record problems never end up here.

use crate::errors::{CatalogError, ConfigError, ExecutionError, SinkError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Source type '{source_type}' is not supported. Available: {}", .available.join(", "))]
    UnsupportedSource {
        source_type: String,
        available: Vec<&'static str>,
    },

    #[error("Failed to create source '{source_type}': {reason}")]
    SourceCreationFailed { source_type: String, reason: String },

    #[error("Invalid topology:\n{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n"))]
    InvalidTopology(Vec<ValidationError>),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("Workflow has already been executed")]
    AlreadyExecuted,
}

impl From<Vec<ValidationError>> for WorkflowError {
    fn from(errors: Vec<ValidationError>) -> Self {
        WorkflowError::InvalidTopology(errors)
    }
}
