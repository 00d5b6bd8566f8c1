// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the workflow driver.
//!
//! This module contains message types for logging events related to:
//! * Workflow start and completion
//! * Source, catalog and sink lifecycle
//! * Stop requests

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Workflow is about to walk its source topology.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use metadata_ingestion::observability::messages::workflow::WorkflowStarted;
///
/// let msg = WorkflowStarted {
///     source_type: "sample-database",
///     service_name: "local_warehouse",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct WorkflowStarted<'a> {
    pub source_type: &'a str,
    pub service_name: &'a str,
}

impl Display for WorkflowStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting ingestion of '{}' with source '{}'",
            self.service_name, self.source_type
        )
    }
}

impl StructuredLog for WorkflowStarted<'_> {
    fn log(&self) {
        tracing::info!(
            source_type = self.source_type,
            service_name = self.service_name,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "workflow",
            span_name = name,
            source_type = self.source_type,
            service_name = self.service_name,
        )
    }
}

/// Source connector and its topology are ready.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct SourceCreated<'a> {
    pub source_type: &'a str,
    pub root: &'a str,
    pub node_count: usize,
}

impl Display for SourceCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created source '{}' with topology root '{}' ({} nodes)",
            self.source_type, self.root, self.node_count
        )
    }
}

impl StructuredLog for SourceCreated<'_> {
    fn log(&self) {
        tracing::debug!(
            source_type = self.source_type,
            root = self.root,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "source",
            span_name = name,
            source_type = self.source_type,
            root = self.root,
        )
    }
}

/// Local catalog loaded from disk.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct CatalogOpened<'a> {
    pub path: &'a str,
    pub entities: usize,
}

impl Display for CatalogOpened<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Opened catalog '{}' with {} entities",
            self.path, self.entities
        )
    }
}

impl StructuredLog for CatalogOpened<'_> {
    fn log(&self) {
        tracing::debug!(path = self.path, entities = self.entities, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("catalog", span_name = name, path = self.path)
    }
}

/// Stop was requested from outside the workflow (e.g. Ctrl-C).
///
/// # Log Level
/// `warn!` - Potential issue or degraded operation
pub struct StopRequested<'a> {
    pub reason: &'a str,
}

impl Display for StopRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stop requested ({}), finishing the current record", self.reason)
    }
}

impl StructuredLog for StopRequested<'_> {
    fn log(&self) {
        tracing::warn!(reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("stop", span_name = name, reason = self.reason)
    }
}

/// Sink could not flush or persist on close.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct SinkCloseFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for SinkCloseFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to close sink: {}", self.error)
    }
}

impl StructuredLog for SinkCloseFailed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("sink_close", span_name = name, error = %self.error)
    }
}

/// Workflow finished and its outcome was decided.
///
/// # Log Level
/// `info!` on success, `warn!` with warnings, `error!` on failure
pub struct WorkflowCompleted<'a> {
    pub outcome: &'a str,
    pub success_percentage: f64,
    pub failures: usize,
    pub warnings: usize,
    pub duration: std::time::Duration,
}

impl Display for WorkflowCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Workflow {} in {:?} ({:.2}% success, {} failures, {} warnings)",
            self.outcome, self.duration, self.success_percentage, self.failures, self.warnings
        )
    }
}

impl StructuredLog for WorkflowCompleted<'_> {
    fn log(&self) {
        if self.failures > 0 {
            tracing::error!(
                outcome = self.outcome,
                success_percentage = self.success_percentage,
                failures = self.failures,
                warnings = self.warnings,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            );
        } else if self.warnings > 0 {
            tracing::warn!(
                outcome = self.outcome,
                success_percentage = self.success_percentage,
                warnings = self.warnings,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            );
        } else {
            tracing::info!(
                outcome = self.outcome,
                success_percentage = self.success_percentage,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "workflow_completed",
            span_name = name,
            outcome = self.outcome,
            success_percentage = self.success_percentage,
        )
    }
}
