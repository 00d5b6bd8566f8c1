// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging for the ingestion engine.
//!
//! Log lines are not written inline. Each event is a message struct in
//! [`messages`] that implements `Display` for the text and
//! [`messages::StructuredLog`] for the level and fields, so the same event always
//! reads the same way.
//!
//! # Architecture
//!
//! * `messages::engine` - topology runner lifecycle and per-record events
//! * `messages::validation` - topology validation results
//! * `messages::workflow` - workflow driver, catalog and sink lifecycle
//! * `logging` - subscriber setup for the binary
//!
//! # Usage
//!
//! ```rust
//! use metadata_ingestion::observability::messages::engine::RecordFailed;
//!
//! let msg = RecordFailed {
//!     name: "orders",
//!     error: "KeyError: 'columns'",
//! };
//!
//! tracing::error!("{}", msg);
//! ```

mod logging;
pub mod messages;

pub use logging::init_logging;
