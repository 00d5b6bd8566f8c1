// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{filter_by, SourceConfig, SourceSection};
use crate::errors::{ExecutionError, WorkflowError};
use crate::models::{
    AddLineageRequest, CreateEntityRequest, EntityRef, EntityType, Record, StackTraceError,
};
use crate::sources::dashboard::DashboardServiceSource;
use crate::sources::sample_data::{parse_connection, produce_filtered, simulated_failure, Named};
use crate::topology::{fail, single, ContextKey, IngestionScope, Produce, StageOutput};
use crate::traits::{Connector, ServiceSpec};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SampleDashboardConnection {
    #[serde(default)]
    pub data_models: Vec<SampleDataModel>,
    #[serde(default)]
    pub dashboards: Vec<SampleDashboard>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleDataModel {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleDashboard {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub charts: Vec<SampleChart>,
    /// Names of the data models the dashboard reads from.
    #[serde(default)]
    pub data_models: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleChart {
    pub name: String,
    #[serde(default)]
    pub chart_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Named for SampleDataModel {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for SampleDashboard {
    fn name(&self) -> &str {
        &self.name
    }
}

pub struct SampleDashboardSource {
    service: ServiceSpec,
    config: SourceConfig,
    connection: SampleDashboardConnection,
}

impl SampleDashboardSource {
    pub fn new(source: &SourceSection) -> Result<Self, WorkflowError> {
        Ok(Self {
            service: ServiceSpec::from_source(source),
            config: source.source_config.clone(),
            connection: parse_connection(source)?,
        })
    }
}

impl Connector for SampleDashboardSource {
    fn service(&self) -> &ServiceSpec {
        &self.service
    }

    fn source_config(&self) -> &SourceConfig {
        &self.config
    }
}

impl DashboardServiceSource for SampleDashboardSource {
    type DataModel = SampleDataModel;
    type Dashboard = SampleDashboard;

    fn list_datamodels<'a>(&'a self, _scope: &IngestionScope) -> Produce<'a, SampleDataModel> {
        produce_filtered(
            &self.connection.data_models,
            self.config.filter_patterns.data_model.as_ref(),
            "data model",
        )
    }

    fn yield_datamodel<'a>(
        &'a self,
        model: &'a SampleDataModel,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        if let Some(failure) = simulated_failure(&model.name, &model.error) {
            return fail(failure);
        }
        single(|| {
            let service = scope.fqn(ContextKey::DashboardService)?;
            Ok::<_, ExecutionError>(
                CreateEntityRequest::new(
                    EntityType::DashboardDataModel,
                    model.name.as_str(),
                    Some(service),
                )
                .with_description(model.description.clone())
                .with_body(json!({ "sql": model.sql }))
                .into(),
            )
        })
    }

    fn get_dashboards_list<'a>(&'a self, _scope: &IngestionScope) -> Produce<'a, SampleDashboard> {
        produce_filtered(
            &self.connection.dashboards,
            self.config.filter_patterns.dashboard.as_ref(),
            "dashboard",
        )
    }

    fn yield_dashboard_chart<'a>(
        &'a self,
        dashboard: &'a SampleDashboard,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        let service = match scope.fqn(ContextKey::DashboardService) {
            Ok(service) => service.clone(),
            Err(error) => return fail(error),
        };
        let chart_filter = self.config.filter_patterns.chart.as_ref();

        Box::new(
            dashboard
                .charts
                .iter()
                .filter(move |chart| !filter_by(chart_filter, &chart.name))
                .map(move |chart| {
                    let request = CreateEntityRequest::new(
                        EntityType::Chart,
                        chart.name.as_str(),
                        Some(&service),
                    )
                    .with_description(chart.description.clone())
                    .with_body(json!({ "chartType": chart.chart_type }));
                    Ok::<_, StackTraceError>(Record::from(request))
                }),
        )
    }

    fn yield_dashboard<'a>(
        &'a self,
        dashboard: &'a SampleDashboard,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        if let Some(failure) = simulated_failure(&dashboard.name, &dashboard.error) {
            return fail(failure);
        }
        single(|| {
            let service = scope.fqn(ContextKey::DashboardService)?;
            let charts: Vec<&str> = scope
                .get_all(ContextKey::Chart)
                .iter()
                .map(|chart| chart.fqn.as_str())
                .collect();
            let mut request =
                CreateEntityRequest::new(EntityType::Dashboard, dashboard.name.as_str(), Some(service))
                    .with_description(dashboard.description.clone())
                    .with_body(json!({ "charts": charts, "sourceUrl": dashboard.url }));
            if let Some(display_name) = &dashboard.display_name {
                request = request.with_display_name(display_name.as_str());
            }
            Ok::<_, ExecutionError>(request.into())
        })
    }

    /// Data model → dashboard edges for the models ingested in this run.
    fn yield_dashboard_lineage_details<'a>(
        &'a self,
        dashboard: &'a SampleDashboard,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        let current = match scope.get(ContextKey::Dashboard) {
            Ok(current) => current.clone(),
            Err(error) => return fail(error),
        };
        let models: Vec<EntityRef> = scope
            .get_all(ContextKey::DataModel)
            .iter()
            .filter(|model| dashboard.data_models.contains(&model.name))
            .cloned()
            .collect();

        Box::new(models.into_iter().map(move |model| {
            Ok::<_, StackTraceError>(Record::from(AddLineageRequest {
                from: model,
                to: current.clone(),
                description: None,
            }))
        }))
    }
}
