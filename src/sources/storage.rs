// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Storage family: service → container.

use crate::engine::mark_deleted_under;
use crate::errors::ValidationError;
use crate::models::{EntityType, StackTraceError};
use crate::topology::{
    single, ContextKey, HookContext, IngestionScope, Produce, StageOutput, StageSpec, Topology,
    TopologyNode,
};
use crate::traits::{Connector, ServiceSpec};

pub trait StorageServiceSource: Connector + Sized + 'static {
    type Container: 'static;

    fn yield_storage_service<'a>(
        &'a self,
        service: &'a ServiceSpec,
        _scope: &IngestionScope,
    ) -> StageOutput<'a> {
        single(|| {
            Ok::<_, StackTraceError>(service.create_request(EntityType::StorageService).into())
        })
    }

    /// Top-level containers (buckets) of the service.
    fn get_containers<'a>(&'a self, scope: &IngestionScope) -> Produce<'a, Self::Container>;

    fn yield_container<'a>(
        &'a self,
        container: &'a Self::Container,
        scope: &IngestionScope,
    ) -> StageOutput<'a>;

    fn mark_containers_as_deleted<'a>(&'a self, context: &'a HookContext<'a>) -> StageOutput<'a> {
        mark_deleted_under(
            self.source_config(),
            context,
            EntityType::Container,
            Some(ContextKey::StorageService),
        )
    }
}

pub fn storage_topology<C: StorageServiceSource>() -> Result<Topology<C>, Vec<ValidationError>> {
    let service = TopologyNode::<C>::builder::<ServiceSpec>("storage_service", C::get_services)
        .stage(
            StageSpec::new("yield_storage_service", EntityType::StorageService)
                .context(ContextKey::StorageService)
                .keep_existing(),
            C::yield_storage_service,
        )
        .child("container")
        .post_process("mark_containers_as_deleted", C::mark_containers_as_deleted)
        .build();

    let container = TopologyNode::<C>::builder::<C::Container>("container", C::get_containers)
        .stage(
            StageSpec::new("yield_container", EntityType::Container)
                .context(ContextKey::Container)
                .consumes(&[ContextKey::StorageService])
                .use_cache()
                .track_deletion(),
            C::yield_container,
        )
        .nullable()
        .cache_all()
        .build();

    Topology::new("storage_service", vec![service, container])
}
