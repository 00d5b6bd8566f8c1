// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-record outcome type.
//!
//! Every producer, processor and post-process hook reports each record as an
//! [`Either`]: `Ok` carries the successfully built value, `Err` carries a
//! [`StackTraceError`] describing why that single record could not be built.
//! A failed record is a value, not a panic, so the runner can record it and
//! move on to the next one.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Structured error for a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTraceError {
    /// Key of the record that failed (entity name, node/processor pair, ...)
    pub name: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl StackTraceError {
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
            stack_trace: None,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Build from any error, keeping its `source()` chain as the trace.
    pub fn from_error(name: impl Into<String>, error: &dyn std::error::Error) -> Self {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        let err = Self::new(name, error.to_string());
        if chain.is_empty() {
            err
        } else {
            err.with_stack_trace(chain.join("\ncaused by: "))
        }
    }
}

impl Display for StackTraceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}

impl std::error::Error for StackTraceError {}

/// Tagged union of a per-record failure or a successfully built value.
pub type Either<T> = Result<T, StackTraceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExecutionError;
    use crate::topology::ContextKey;

    #[test]
    fn test_from_error_keeps_message() {
        let error = ExecutionError::ContextNotPopulated {
            key: ContextKey::DatabaseSchema,
        };
        let err = StackTraceError::from_error("orders", &error);

        assert_eq!(err.name, "orders");
        assert!(err.error.contains("database_schema"));
        assert!(err.stack_trace.is_none());
    }

    #[test]
    fn test_display() {
        let err = StackTraceError::new("t2", "missing key 'columns'").with_stack_trace("trace");
        assert_eq!(err.to_string(), "t2: missing key 'columns'");
        assert_eq!(err.stack_trace.as_deref(), Some("trace"));
    }
}
