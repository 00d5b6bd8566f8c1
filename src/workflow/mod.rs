// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod ingestion;
mod source;


pub use ingestion::{evaluate_outcome, IngestionWorkflow, WorkflowOutcome};
pub use source::{TopologySource, WorkflowSource};
