// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the topology runner.
//!
//! This module contains message types for logging events related to:
//! * Run lifecycle (start, completion, interruption)
//! * Node visits and skipped subtrees
//! * Per-record failures, filtered records and sink write errors

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Topology walk started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct TopologyRunStarted<'a> {
    pub root: &'a str,
    pub node_count: usize,
}

impl Display for TopologyRunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting topology run at '{}' ({} nodes)",
            self.root, self.node_count
        )
    }
}

impl StructuredLog for TopologyRunStarted<'_> {
    fn log(&self) {
        tracing::info!(root = self.root, node_count = self.node_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "topology_run",
            span_name = name,
            root = self.root,
            node_count = self.node_count,
        )
    }
}

/// Topology walk finished, possibly early.
///
/// # Log Level
/// `info!` - Important operational event
pub struct TopologyRunCompleted {
    pub records: usize,
    pub updated: usize,
    pub failures: usize,
    pub filtered: usize,
    pub interrupted: bool,
    pub duration: std::time::Duration,
}

impl Display for TopologyRunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Topology run {} in {:?}: {} records, {} updated, {} failures, {} filtered",
            if self.interrupted { "interrupted" } else { "completed" },
            self.duration,
            self.records,
            self.updated,
            self.failures,
            self.filtered
        )
    }
}

impl StructuredLog for TopologyRunCompleted {
    fn log(&self) {
        tracing::info!(
            records = self.records,
            updated = self.updated,
            failures = self.failures,
            filtered = self.filtered,
            interrupted = self.interrupted,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "topology_run_completed",
            span_name = name,
            records = self.records,
            failures = self.failures,
            interrupted = self.interrupted,
        )
    }
}

/// Entering a node for one parent item.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct NodeVisitStarted<'a> {
    pub node: &'a str,
    pub stage_count: usize,
}

impl Display for NodeVisitStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Visiting node '{}' ({} stages)", self.node, self.stage_count)
    }
}

impl StructuredLog for NodeVisitStarted<'_> {
    fn log(&self) {
        tracing::debug!(node = self.node, stage_count = self.stage_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("node", span_name = name, node = self.node)
    }
}

/// A node's producer yielded nothing.
///
/// # Log Level
/// `warn!` - Degraded but recoverable
pub struct NodeProducedNothing<'a> {
    pub node: &'a str,
}

impl Display for NodeProducedNothing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' produced no items; skipping its subtree", self.node)
    }
}

impl StructuredLog for NodeProducedNothing<'_> {
    fn log(&self) {
        tracing::warn!(node = self.node, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("node_produced_nothing", span_name = name, node = self.node)
    }
}

/// Children of an item are skipped because a context-bearing stage failed.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct ChildrenSkipped<'a> {
    pub node: &'a str,
    pub stage: &'a str,
}

impl Display for ChildrenSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Skipping children of '{}': stage '{}' produced no entity for this item",
            self.node, self.stage
        )
    }
}

impl StructuredLog for ChildrenSkipped<'_> {
    fn log(&self) {
        tracing::debug!(node = self.node, stage = self.stage, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("children_skipped", span_name = name, node = self.node, stage = self.stage)
    }
}

/// A single record failed and was recorded in the status.
///
/// # Log Level
/// `warn!` - Degraded but recoverable
pub struct RecordFailed<'a> {
    pub name: &'a str,
    pub error: &'a str,
}

impl Display for RecordFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to process '{}': {}", self.name, self.error)
    }
}

impl StructuredLog for RecordFailed<'_> {
    fn log(&self) {
        tracing::warn!(record = self.name, error = self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("record_failed", span_name = name, record = self.name)
    }
}

/// A record was excluded by a filter pattern.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct RecordFiltered<'a> {
    pub name: &'a str,
    pub reason: &'a str,
}

impl Display for RecordFiltered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Filtered '{}': {}", self.name, self.reason)
    }
}

impl StructuredLog for RecordFiltered<'_> {
    fn log(&self) {
        tracing::debug!(record = self.name, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("record_filtered", span_name = name, record = self.name)
    }
}

/// Unchanged fingerprint; the sink write is skipped.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct RecordUnchanged<'a> {
    pub fqn: &'a str,
}

impl Display for RecordUnchanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "'{}' is unchanged since the last run", self.fqn)
    }
}

impl StructuredLog for RecordUnchanged<'_> {
    fn log(&self) {
        tracing::debug!(fqn = self.fqn, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("record_unchanged", span_name = name, fqn = self.fqn)
    }
}

/// The sink rejected a record.
///
/// # Log Level
/// `warn!` - Degraded but recoverable
pub struct SinkWriteFailed<'a> {
    pub record: &'a str,
    pub error: &'a str,
}

impl Display for SinkWriteFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Sink failed to write '{}': {}", self.record, self.error)
    }
}

impl StructuredLog for SinkWriteFailed<'_> {
    fn log(&self) {
        tracing::warn!(record = self.record, error = self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("sink_write_failed", span_name = name, record = self.record)
    }
}

/// Prefetching catalog entities for a `cache_all` node failed.
///
/// # Log Level
/// `warn!` - Degraded but recoverable
pub struct CachePrefetchFailed<'a> {
    pub node: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CachePrefetchFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Could not prefetch catalog entities for '{}', falling back to lookups: {}",
            self.node, self.error
        )
    }
}

impl StructuredLog for CachePrefetchFailed<'_> {
    fn log(&self) {
        tracing::warn!(node = self.node, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("cache_prefetch_failed", span_name = name, node = self.node)
    }
}

/// The stop signal was observed.
///
/// # Log Level
/// `warn!` - Degraded but recoverable
pub struct RunInterrupted<'a> {
    pub before: &'a str,
}

impl Display for RunInterrupted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stop requested; interrupting the run before '{}'", self.before)
    }
}

impl StructuredLog for RunInterrupted<'_> {
    fn log(&self) {
        tracing::warn!(before = self.before, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("run_interrupted", span_name = name, before = self.before)
    }
}
