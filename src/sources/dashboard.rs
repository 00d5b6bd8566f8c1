// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dashboard family: service → {data model, dashboard}.
//!
//! Data models are walked first and kept in the scope as a list, so the
//! dashboard node can link dashboards to the models they read from. Charts are
//! collected per dashboard and dropped before the next one.

use crate::engine::mark_deleted_under;
use crate::errors::ValidationError;
use crate::models::{EntityType, StackTraceError};
use crate::topology::{
    no_records, single, ContextKey, HookContext, IngestionScope, Produce, StageOutput, StageSpec,
    Topology, TopologyNode,
};
use crate::traits::{Connector, ServiceSpec};

pub trait DashboardServiceSource: Connector + Sized + 'static {
    type DataModel: 'static;
    type Dashboard: 'static;

    fn yield_dashboard_service<'a>(
        &'a self,
        service: &'a ServiceSpec,
        _scope: &IngestionScope,
    ) -> StageOutput<'a> {
        single(|| {
            Ok::<_, StackTraceError>(service.create_request(EntityType::DashboardService).into())
        })
    }

    fn list_datamodels<'a>(&'a self, scope: &IngestionScope) -> Produce<'a, Self::DataModel>;

    fn yield_datamodel<'a>(
        &'a self,
        model: &'a Self::DataModel,
        scope: &IngestionScope,
    ) -> StageOutput<'a>;

    fn get_dashboards_list<'a>(&'a self, scope: &IngestionScope) -> Produce<'a, Self::Dashboard>;

    /// Charts of one dashboard; every success is appended to the chart list.
    fn yield_dashboard_chart<'a>(
        &'a self,
        dashboard: &'a Self::Dashboard,
        scope: &IngestionScope,
    ) -> StageOutput<'a>;

    fn yield_dashboard<'a>(
        &'a self,
        dashboard: &'a Self::Dashboard,
        scope: &IngestionScope,
    ) -> StageOutput<'a>;

    fn yield_dashboard_lineage_details<'a>(
        &'a self,
        _dashboard: &'a Self::Dashboard,
        _scope: &IngestionScope,
    ) -> StageOutput<'a> {
        no_records()
    }

    fn mark_dashboards_as_deleted<'a>(&'a self, context: &'a HookContext<'a>) -> StageOutput<'a> {
        mark_deleted_under(
            self.source_config(),
            context,
            EntityType::Dashboard,
            Some(ContextKey::DashboardService),
        )
    }

    fn mark_datamodels_as_deleted<'a>(&'a self, context: &'a HookContext<'a>) -> StageOutput<'a> {
        mark_deleted_under(
            self.source_config(),
            context,
            EntityType::DashboardDataModel,
            Some(ContextKey::DashboardService),
        )
    }
}

pub fn dashboard_topology<C: DashboardServiceSource>() -> Result<Topology<C>, Vec<ValidationError>> {
    let service = TopologyNode::<C>::builder::<ServiceSpec>("dashboard_service", C::get_services)
        .stage(
            StageSpec::new("yield_dashboard_service", EntityType::DashboardService)
                .context(ContextKey::DashboardService)
                .keep_existing(),
            C::yield_dashboard_service,
        )
        .child("data_model")
        .child("dashboard")
        .post_process("mark_dashboards_as_deleted", C::mark_dashboards_as_deleted)
        .post_process("mark_datamodels_as_deleted", C::mark_datamodels_as_deleted)
        .build();

    let data_model = TopologyNode::<C>::builder::<C::DataModel>("data_model", C::list_datamodels)
        .stage(
            StageSpec::new("yield_datamodel", EntityType::DashboardDataModel)
                .context(ContextKey::DataModel)
                .consumes(&[ContextKey::DashboardService])
                .store_all()
                .use_cache()
                .track_deletion()
                .nullable(),
            C::yield_datamodel,
        )
        .nullable()
        .cache_all()
        .build();

    let dashboard = TopologyNode::<C>::builder::<C::Dashboard>("dashboard", C::get_dashboards_list)
        .stage(
            StageSpec::new("yield_dashboard_chart", EntityType::Chart)
                .context(ContextKey::Chart)
                .consumes(&[ContextKey::DashboardService])
                .store_all()
                .clear_context()
                .nullable(),
            C::yield_dashboard_chart,
        )
        .stage(
            StageSpec::new("yield_dashboard", EntityType::Dashboard)
                .context(ContextKey::Dashboard)
                .consumes(&[ContextKey::DashboardService])
                .use_cache()
                .track_deletion(),
            C::yield_dashboard,
        )
        .stage(
            StageSpec::new("yield_dashboard_lineage_details", EntityType::Lineage)
                .consumes(&[ContextKey::Dashboard])
                .nullable(),
            C::yield_dashboard_lineage_details,
        )
        .cache_all()
        .build();

    Topology::new("dashboard_service", vec![service, data_model, dashboard])
}
