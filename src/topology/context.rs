// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Ingestion scope: the context threaded through a topology walk.
//!
//! Every stage that declares a [`ContextKey`] publishes its latest successful
//! entity here. Stages further down the branch read ancestors' entities (to build
//! FQNs and references) without receiving them as parameters. The runner is the
//! only writer; connectors get a shared reference.

use crate::errors::ExecutionError;
use crate::models::{EntityRef, Fqn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// One slot of the ingestion scope per hierarchy level of every source family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKey {
    DatabaseService,
    Database,
    DatabaseSchema,
    Table,
    StoredProcedure,
    DashboardService,
    DataModel,
    Chart,
    Dashboard,
    PipelineService,
    Pipeline,
    MessagingService,
    Topic,
    MlModelService,
    MlModel,
    StorageService,
    Container,
}

impl ContextKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKey::DatabaseService => "database_service",
            ContextKey::Database => "database",
            ContextKey::DatabaseSchema => "database_schema",
            ContextKey::Table => "table",
            ContextKey::StoredProcedure => "stored_procedure",
            ContextKey::DashboardService => "dashboard_service",
            ContextKey::DataModel => "data_model",
            ContextKey::Chart => "chart",
            ContextKey::Dashboard => "dashboard",
            ContextKey::PipelineService => "pipeline_service",
            ContextKey::Pipeline => "pipeline",
            ContextKey::MessagingService => "messaging_service",
            ContextKey::Topic => "topic",
            ContextKey::MlModelService => "mlmodel_service",
            ContextKey::MlModel => "mlmodel",
            ContextKey::StorageService => "storage_service",
            ContextKey::Container => "container",
        }
    }

    pub fn is_service(&self) -> bool {
        matches!(
            self,
            ContextKey::DatabaseService
                | ContextKey::DashboardService
                | ContextKey::PipelineService
                | ContextKey::MessagingService
                | ContextKey::MlModelService
                | ContextKey::StorageService
        )
    }
}

impl Display for ContextKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestionScope {
    values: BTreeMap<ContextKey, Vec<EntityRef>>,
}

impl IngestionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest value stored under `key`.
    pub fn get(&self, key: ContextKey) -> Result<&EntityRef, ExecutionError> {
        self.values
            .get(&key)
            .and_then(|values| values.last())
            .ok_or(ExecutionError::ContextNotPopulated { key })
    }

    /// Every value stored under `key`; empty when unset.
    pub fn get_all(&self, key: ContextKey) -> &[EntityRef] {
        self.values.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fqn(&self, key: ContextKey) -> Result<&Fqn, ExecutionError> {
        self.get(key).map(|entity| &entity.fqn)
    }

    pub fn contains(&self, key: ContextKey) -> bool {
        self.values.get(&key).is_some_and(|values| !values.is_empty())
    }

    pub fn set(&mut self, key: ContextKey, value: EntityRef) {
        self.values.insert(key, vec![value]);
    }

    pub fn append(&mut self, key: ContextKey, value: EntityRef) {
        self.values.entry(key).or_default().push(value);
    }

    pub fn clear(&mut self, key: ContextKey) {
        self.values.remove(&key);
    }

    /// Service of the family currently being walked.
    pub fn service(&self) -> Result<&EntityRef, ExecutionError> {
        self.values
            .iter()
            .filter(|(key, values)| key.is_service() && !values.is_empty())
            .find_map(|(_, values)| values.last())
            .ok_or(ExecutionError::ContextNotPopulated {
                key: ContextKey::DatabaseService,
            })
    }

    pub fn database(&self) -> Result<&EntityRef, ExecutionError> {
        self.get(ContextKey::Database)
    }

    pub fn database_schema(&self) -> Result<&EntityRef, ExecutionError> {
        self.get(ContextKey::DatabaseSchema)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ContextKey> {
        self.values.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityType;

    fn entity(name: &str) -> EntityRef {
        EntityRef::new(EntityType::Table, name, Fqn::build(&["svc", name]))
    }

    #[test]
    fn test_get_unpopulated_fails() {
        let scope = IngestionScope::new();
        assert_eq!(
            scope.get(ContextKey::Table),
            Err(ExecutionError::ContextNotPopulated {
                key: ContextKey::Table
            })
        );
    }

    #[test]
    fn test_set_overwrites_and_append_accumulates() {
        let mut scope = IngestionScope::new();
        scope.set(ContextKey::Table, entity("a"));
        scope.set(ContextKey::Table, entity("b"));
        assert_eq!(scope.get(ContextKey::Table).unwrap().name, "b");
        assert_eq!(scope.get_all(ContextKey::Table).len(), 1);

        scope.append(ContextKey::Chart, entity("c1"));
        scope.append(ContextKey::Chart, entity("c2"));
        assert_eq!(scope.get_all(ContextKey::Chart).len(), 2);
        assert_eq!(scope.get(ContextKey::Chart).unwrap().name, "c2");

        scope.clear(ContextKey::Chart);
        assert!(!scope.contains(ContextKey::Chart));
    }

    #[test]
    fn test_service_lookup() {
        let mut scope = IngestionScope::new();
        assert!(scope.service().is_err());
        scope.set(
            ContextKey::PipelineService,
            EntityRef::new(EntityType::PipelineService, "airflow", Fqn::build(&["airflow"])),
        );
        assert_eq!(scope.service().unwrap().name, "airflow");
    }
}
