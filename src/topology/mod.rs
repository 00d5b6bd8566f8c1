// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declarative topologies: nodes, stages, the ingestion scope and validation.

mod context;
mod definition;
mod node;
mod validation;

pub use context::{ContextKey, IngestionScope};
pub use definition::Topology;
pub use node::{
    fail, no_records, single, BoundItem, HookContext, ItemVisitor, NodeBuilder, NodeDefinition,
    NodeDriver, PostProcess, PostProcessFn, Processor, Produce, Produced, Producer, StageOutput,
    StageSpec, TopologyNode,
};
pub use validation::validate_topology;
