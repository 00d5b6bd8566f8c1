// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{SourceConfig, SourceSection};
use crate::models::{CreateEntityRequest, EntityType};
use crate::topology::{IngestionScope, Produce, Produced};

/// The service a connector ingests, as declared in the workflow config.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    pub name: String,
    pub service_type: String,
    pub description: Option<String>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, service_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_type: service_type.into(),
            description: None,
        }
    }

    pub fn from_source(source: &SourceSection) -> Self {
        let description = source
            .service_connection
            .get("description")
            .and_then(|value| value.as_str())
            .map(str::to_string);
        Self {
            name: source.service_name.clone(),
            service_type: source.source_type.clone(),
            description,
        }
    }

    /// Create request for the service entity of a family.
    pub fn create_request(&self, entity_type: EntityType) -> CreateEntityRequest {
        CreateEntityRequest::new(entity_type, self.name.as_str(), None)
            .with_description(self.description.clone())
            .with_body(serde_json::json!({ "serviceType": self.service_type }))
    }
}

/// Base capabilities every source connector has, whatever its family.
pub trait Connector {
    fn service(&self) -> &ServiceSpec;

    fn source_config(&self) -> &SourceConfig;

    /// Release connections; called once by the workflow, after the run.
    fn close(&mut self) {}

    /// Root producer of every family topology.
    fn get_services<'a>(&'a self, _scope: &IngestionScope) -> Produce<'a, ServiceSpec> {
        Box::new(std::iter::once(Ok(Produced::Item(self.service().clone()))))
    }
}
