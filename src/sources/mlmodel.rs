// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! ML model family: service → model.
//!
//! Models are flat below their service; features and hyperparameters travel
//! inside the opaque entity body.

use crate::engine::mark_deleted_under;
use crate::errors::ValidationError;
use crate::models::{EntityType, StackTraceError};
use crate::topology::{
    single, ContextKey, HookContext, IngestionScope, Produce, StageOutput, StageSpec, Topology,
    TopologyNode,
};
use crate::traits::{Connector, ServiceSpec};

pub trait MlModelServiceSource: Connector + Sized + 'static {
    type MlModel: 'static;

    fn yield_mlmodel_service<'a>(
        &'a self,
        service: &'a ServiceSpec,
        _scope: &IngestionScope,
    ) -> StageOutput<'a> {
        single(|| {
            Ok::<_, StackTraceError>(service.create_request(EntityType::MlModelService).into())
        })
    }

    fn get_mlmodels<'a>(&'a self, scope: &IngestionScope) -> Produce<'a, Self::MlModel>;

    fn yield_mlmodel<'a>(
        &'a self,
        model: &'a Self::MlModel,
        scope: &IngestionScope,
    ) -> StageOutput<'a>;

    fn mark_mlmodels_as_deleted<'a>(&'a self, context: &'a HookContext<'a>) -> StageOutput<'a> {
        mark_deleted_under(
            self.source_config(),
            context,
            EntityType::MlModel,
            Some(ContextKey::MlModelService),
        )
    }
}

pub fn mlmodel_topology<C: MlModelServiceSource>() -> Result<Topology<C>, Vec<ValidationError>> {
    let service = TopologyNode::<C>::builder::<ServiceSpec>("mlmodel_service", C::get_services)
        .stage(
            StageSpec::new("yield_mlmodel_service", EntityType::MlModelService)
                .context(ContextKey::MlModelService)
                .keep_existing(),
            C::yield_mlmodel_service,
        )
        .child("mlmodel")
        .post_process("mark_mlmodels_as_deleted", C::mark_mlmodels_as_deleted)
        .build();

    let mlmodel = TopologyNode::<C>::builder::<C::MlModel>("mlmodel", C::get_mlmodels)
        .stage(
            StageSpec::new("yield_mlmodel", EntityType::MlModel)
                .context(ContextKey::MlModel)
                .consumes(&[ContextKey::MlModelService])
                .use_cache()
                .track_deletion(),
            C::yield_mlmodel,
        )
        .cache_all()
        .build();

    Topology::new("mlmodel_service", vec![service, mlmodel])
}
