// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Every diagnostic or operational log line of the crate is a small struct that
//! implements `Display` for the human-readable text and [`StructuredLog`] for the
//! structured fields.
//!
//! # Organization
//!
//! * `engine` - topology runner lifecycle and per-record events
//! * `validation` - topology validation errors
//! * `workflow` - workflow driver, source and sink lifecycle
//!
//! # Usage Pattern
//!
//! ```rust
//! use metadata_ingestion::observability::messages::engine::TopologyRunStarted;
//! use metadata_ingestion::observability::messages::StructuredLog;
//!
//! let msg = TopologyRunStarted {
//!     root: "root",
//!     node_count: 5,
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod engine;
pub mod validation;
pub mod workflow;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
