// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline family: service → pipeline, with run status and lineage per pipeline.

use crate::engine::mark_deleted_under;
use crate::errors::ValidationError;
use crate::models::{EntityType, StackTraceError};
use crate::topology::{
    no_records, single, ContextKey, HookContext, IngestionScope, Produce, StageOutput, StageSpec,
    Topology, TopologyNode,
};
use crate::traits::{Connector, ServiceSpec};

pub trait PipelineServiceSource: Connector + Sized + 'static {
    type Pipeline: 'static;

    fn yield_pipeline_service<'a>(
        &'a self,
        service: &'a ServiceSpec,
        _scope: &IngestionScope,
    ) -> StageOutput<'a> {
        single(|| {
            Ok::<_, StackTraceError>(service.create_request(EntityType::PipelineService).into())
        })
    }

    fn get_pipelines_list<'a>(&'a self, scope: &IngestionScope) -> Produce<'a, Self::Pipeline>;

    fn yield_pipeline<'a>(
        &'a self,
        pipeline: &'a Self::Pipeline,
        scope: &IngestionScope,
    ) -> StageOutput<'a>;

    fn yield_pipeline_status<'a>(
        &'a self,
        _pipeline: &'a Self::Pipeline,
        _scope: &IngestionScope,
    ) -> StageOutput<'a> {
        no_records()
    }

    fn yield_pipeline_lineage_details<'a>(
        &'a self,
        _pipeline: &'a Self::Pipeline,
        _scope: &IngestionScope,
    ) -> StageOutput<'a> {
        no_records()
    }

    fn mark_pipelines_as_deleted<'a>(&'a self, context: &'a HookContext<'a>) -> StageOutput<'a> {
        mark_deleted_under(
            self.source_config(),
            context,
            EntityType::Pipeline,
            Some(ContextKey::PipelineService),
        )
    }
}

pub fn pipeline_topology<C: PipelineServiceSource>() -> Result<Topology<C>, Vec<ValidationError>> {
    let service = TopologyNode::<C>::builder::<ServiceSpec>("pipeline_service", C::get_services)
        .stage(
            StageSpec::new("yield_pipeline_service", EntityType::PipelineService)
                .context(ContextKey::PipelineService)
                .keep_existing(),
            C::yield_pipeline_service,
        )
        .child("pipeline")
        .post_process("mark_pipelines_as_deleted", C::mark_pipelines_as_deleted)
        .build();

    let pipeline = TopologyNode::<C>::builder::<C::Pipeline>("pipeline", C::get_pipelines_list)
        .stage(
            StageSpec::new("yield_pipeline", EntityType::Pipeline)
                .context(ContextKey::Pipeline)
                .consumes(&[ContextKey::PipelineService])
                .use_cache()
                .track_deletion(),
            C::yield_pipeline,
        )
        .stage(
            StageSpec::new("yield_pipeline_status", EntityType::PipelineStatus)
                .consumes(&[ContextKey::Pipeline])
                .nullable(),
            C::yield_pipeline_status,
        )
        .stage(
            StageSpec::new("yield_pipeline_lineage_details", EntityType::Lineage)
                .consumes(&[ContextKey::Pipeline])
                .nullable(),
            C::yield_pipeline_lineage_details,
        )
        .cache_all()
        .build();

    Topology::new("pipeline_service", vec![service, pipeline])
}
