// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{SourceConfig, SourceSection};
use crate::errors::{ExecutionError, WorkflowError};
use crate::models::{
    AddLineageRequest, CreateEntityRequest, EntityRef, EntityType, ExecutionState, Fqn,
    PipelineStatusRecord, Record, StackTraceError,
};
use crate::sources::pipeline::PipelineServiceSource;
use crate::sources::sample_data::{parse_connection, produce_filtered, simulated_failure, Named};
use crate::topology::{fail, no_records, single, ContextKey, IngestionScope, Produce, StageOutput};
use crate::traits::{Connector, ServiceSpec};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SamplePipelineConnection {
    #[serde(default)]
    pub pipelines: Vec<SamplePipeline>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplePipeline {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub tasks: Vec<SampleTask>,
    #[serde(default)]
    pub last_run: Option<SampleRun>,
    /// Table FQNs the pipeline reads.
    #[serde(default)]
    pub inlets: Vec<String>,
    /// Table FQNs the pipeline writes.
    #[serde(default)]
    pub outlets: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleTask {
    pub name: String,
    #[serde(default)]
    pub downstream: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleRun {
    pub run_id: String,
    pub state: ExecutionState,
    pub timestamp: DateTime<Utc>,
}

impl Named for SamplePipeline {
    fn name(&self) -> &str {
        &self.name
    }
}

pub struct SamplePipelineSource {
    service: ServiceSpec,
    config: SourceConfig,
    connection: SamplePipelineConnection,
}

impl SamplePipelineSource {
    pub fn new(source: &SourceSection) -> Result<Self, WorkflowError> {
        Ok(Self {
            service: ServiceSpec::from_source(source),
            config: source.source_config.clone(),
            connection: parse_connection(source)?,
        })
    }
}

fn table_ref(fqn: &str) -> EntityRef {
    let fqn = Fqn::from_raw(fqn);
    let name = fqn.parts().pop().unwrap_or_default();
    EntityRef::new(EntityType::Table, name, fqn)
}

impl Connector for SamplePipelineSource {
    fn service(&self) -> &ServiceSpec {
        &self.service
    }

    fn source_config(&self) -> &SourceConfig {
        &self.config
    }
}

impl PipelineServiceSource for SamplePipelineSource {
    type Pipeline = SamplePipeline;

    fn get_pipelines_list<'a>(&'a self, _scope: &IngestionScope) -> Produce<'a, SamplePipeline> {
        produce_filtered(
            &self.connection.pipelines,
            self.config.filter_patterns.pipeline.as_ref(),
            "pipeline",
        )
    }

    fn yield_pipeline<'a>(
        &'a self,
        pipeline: &'a SamplePipeline,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        if let Some(failure) = simulated_failure(&pipeline.name, &pipeline.error) {
            return fail(failure);
        }
        single(|| {
            let service = scope.fqn(ContextKey::PipelineService)?;
            let tasks: Vec<_> = pipeline
                .tasks
                .iter()
                .map(|task| json!({ "name": task.name, "downstreamTasks": task.downstream }))
                .collect();
            Ok::<_, ExecutionError>(
                CreateEntityRequest::new(EntityType::Pipeline, pipeline.name.as_str(), Some(service))
                    .with_description(pipeline.description.clone())
                    .with_body(json!({ "tasks": tasks, "sourceUrl": pipeline.source_url }))
                    .into(),
            )
        })
    }

    fn yield_pipeline_status<'a>(
        &'a self,
        pipeline: &'a SamplePipeline,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        let Some(run) = &pipeline.last_run else {
            return no_records();
        };
        single(|| {
            let pipeline_fqn = scope.fqn(ContextKey::Pipeline)?.clone();
            Ok::<_, ExecutionError>(Record::PipelineStatus(PipelineStatusRecord {
                pipeline_fqn,
                run_id: run.run_id.clone(),
                state: run.state,
                timestamp: run.timestamp,
            }))
        })
    }

    /// One table → table edge per inlet/outlet pair, described by the pipeline.
    fn yield_pipeline_lineage_details<'a>(
        &'a self,
        pipeline: &'a SamplePipeline,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        let description = match scope.fqn(ContextKey::Pipeline) {
            Ok(fqn) => format!("pipeline {}", fqn),
            Err(error) => return fail(error),
        };
        Box::new(
            pipeline
                .inlets
                .iter()
                .flat_map(move |inlet| pipeline.outlets.iter().map(move |outlet| (inlet, outlet)))
                .map(move |(inlet, outlet)| {
                    Ok::<_, StackTraceError>(Record::from(AddLineageRequest {
                        from: table_ref(inlet),
                        to: table_ref(outlet),
                        description: Some(description.clone()),
                    }))
                }),
        )
    }
}
