// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::SourceSection;
use crate::errors::WorkflowError;
use crate::sources::dashboard::dashboard_topology;
use crate::sources::database::database_topology;
use crate::sources::pipeline::pipeline_topology;
use crate::sources::sample_data::{SampleDashboardSource, SampleDatabaseSource, SamplePipelineSource};
use crate::workflow::{TopologySource, WorkflowSource};

/// Factory for the connectors this binary ships with.
///
/// The `source.type` field of the workflow config picks the connector:
/// - "sample-database" -> SampleDatabaseSource on the database topology
/// - "sample-dashboard" -> SampleDashboardSource on the dashboard topology
/// - "sample-pipeline" -> SamplePipelineSource on the pipeline topology
pub struct SourceFactory;

impl SourceFactory {
    pub fn create_source(source: &SourceSection) -> Result<Box<dyn WorkflowSource>, WorkflowError> {
        let source_type = source.source_type.as_str();
        match source_type {
            "sample-database" => Ok(Box::new(TopologySource::new(
                source_type,
                SampleDatabaseSource::new(source)?,
                database_topology()?,
            ))),
            "sample-dashboard" => Ok(Box::new(TopologySource::new(
                source_type,
                SampleDashboardSource::new(source)?,
                dashboard_topology()?,
            ))),
            "sample-pipeline" => Ok(Box::new(TopologySource::new(
                source_type,
                SamplePipelineSource::new(source)?,
                pipeline_topology()?,
            ))),
            _ => Err(WorkflowError::UnsupportedSource {
                source_type: source.source_type.clone(),
                available: Self::list_available_sources(),
            }),
        }
    }

    pub fn list_available_sources() -> Vec<&'static str> {
        vec!["sample-database", "sample-dashboard", "sample-pipeline"]
    }

    pub fn is_source_available(source_type: &str) -> bool {
        Self::list_available_sources().contains(&source_type)
    }
}
