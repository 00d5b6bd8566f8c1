// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // workflow config + filters
pub mod engine;     // topology runner
pub mod errors;     // error handling
pub mod models;     // records, entities, status
pub mod observability;
pub mod sinks;      // catalog + json-lines sinks
pub mod sources;    // family traits and bundled connectors
pub mod topology;   // node/stage declarations
pub mod traits;     // unified abstractions
pub mod workflow;   // workflow driver
