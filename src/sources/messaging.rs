// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Messaging family: service → topic.

use crate::engine::mark_deleted_under;
use crate::errors::ValidationError;
use crate::models::{EntityType, StackTraceError};
use crate::topology::{
    single, ContextKey, HookContext, IngestionScope, Produce, StageOutput, StageSpec, Topology,
    TopologyNode,
};
use crate::traits::{Connector, ServiceSpec};

pub trait MessagingServiceSource: Connector + Sized + 'static {
    type Topic: 'static;

    fn yield_messaging_service<'a>(
        &'a self,
        service: &'a ServiceSpec,
        _scope: &IngestionScope,
    ) -> StageOutput<'a> {
        single(|| {
            Ok::<_, StackTraceError>(service.create_request(EntityType::MessagingService).into())
        })
    }

    fn get_topics_list<'a>(&'a self, scope: &IngestionScope) -> Produce<'a, Self::Topic>;

    fn yield_topic<'a>(
        &'a self,
        topic: &'a Self::Topic,
        scope: &IngestionScope,
    ) -> StageOutput<'a>;

    fn mark_topics_as_deleted<'a>(&'a self, context: &'a HookContext<'a>) -> StageOutput<'a> {
        mark_deleted_under(
            self.source_config(),
            context,
            EntityType::Topic,
            Some(ContextKey::MessagingService),
        )
    }
}

pub fn messaging_topology<C: MessagingServiceSource>() -> Result<Topology<C>, Vec<ValidationError>> {
    let service = TopologyNode::<C>::builder::<ServiceSpec>("messaging_service", C::get_services)
        .stage(
            StageSpec::new("yield_messaging_service", EntityType::MessagingService)
                .context(ContextKey::MessagingService)
                .keep_existing(),
            C::yield_messaging_service,
        )
        .child("topic")
        .post_process("mark_topics_as_deleted", C::mark_topics_as_deleted)
        .build();

    let topic = TopologyNode::<C>::builder::<C::Topic>("topic", C::get_topics_list)
        .stage(
            StageSpec::new("yield_topic", EntityType::Topic)
                .context(ContextKey::Topic)
                .consumes(&[ContextKey::MessagingService])
                .use_cache()
                .track_deletion(),
            C::yield_topic,
        )
        .cache_all()
        .build();

    Topology::new("messaging_service", vec![service, topic])
}
