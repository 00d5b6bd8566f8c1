// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::{run_topology, RunReport, RunnerOptions};
use crate::errors::ExecutionError;
use crate::topology::{IngestionScope, Topology};
use crate::traits::{Connector, MetadataCatalog, Sink};

/// A connector paired with its topology, with the connector type erased.
///
/// This is the seam between the workflow driver, which only knows config
/// strings, and the typed family traits.
pub trait WorkflowSource {
    fn source_type(&self) -> &str;

    fn topology_root(&self) -> &str;

    fn node_count(&self) -> usize;

    /// Walk the topology once with a fresh ingestion scope.
    fn run(
        &mut self,
        sink: &mut dyn Sink,
        catalog: &dyn MetadataCatalog,
        options: RunnerOptions,
    ) -> Result<RunReport, ExecutionError>;

    fn close(&mut self);
}

pub struct TopologySource<C> {
    source_type: String,
    connector: C,
    topology: Topology<C>,
}

impl<C: Connector> TopologySource<C> {
    pub fn new(source_type: impl Into<String>, connector: C, topology: Topology<C>) -> Self {
        Self {
            source_type: source_type.into(),
            connector,
            topology,
        }
    }
}

impl<C: Connector> WorkflowSource for TopologySource<C> {
    fn source_type(&self) -> &str {
        &self.source_type
    }

    fn topology_root(&self) -> &str {
        self.topology.root()
    }

    fn node_count(&self) -> usize {
        self.topology.len()
    }

    fn run(
        &mut self,
        sink: &mut dyn Sink,
        catalog: &dyn MetadataCatalog,
        options: RunnerOptions,
    ) -> Result<RunReport, ExecutionError> {
        let mut scope = IngestionScope::new();
        run_topology(
            &self.topology,
            &self.connector,
            &mut scope,
            sink,
            catalog,
            options,
        )
    }

    fn close(&mut self) {
        self.connector.close();
    }
}
