// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Records flowing from the topology runner to the sink.

use crate::models::entity::{CreateEntityRequest, EntityRef, EntityType, Fqn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entity as the catalog currently knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntity {
    pub entity_type: EntityType,
    pub name: String,
    pub fqn: Fqn,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    #[serde(default)]
    pub body: serde_json::Value,
    #[serde(default)]
    pub deleted: bool,
}

impl CatalogEntity {
    pub fn from_request(request: &CreateEntityRequest) -> Self {
        Self {
            entity_type: request.entity_type,
            name: request.name.clone(),
            fqn: request.fqn.clone(),
            source_hash: request.source_hash.clone(),
            body: request.body.clone(),
            deleted: false,
        }
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_type, self.name.clone(), self.fqn.clone())
    }
}

/// Update of an existing entity whose source fingerprint changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRequest {
    pub original: CatalogEntity,
    pub updated: CreateEntityRequest,
}

/// Soft (or hard) delete of an entity no longer present at the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteEntity {
    pub entity_type: EntityType,
    pub fqn: Fqn,
    pub soft_delete: bool,
}

/// Directed lineage edge between two entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLineageRequest {
    pub from: EntityRef,
    pub to: EntityRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Successful,
    Failed,
    Pending,
    Skipped,
}

/// Latest run status of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStatusRecord {
    pub pipeline_fqn: Fqn,
    pub run_id: String,
    pub state: ExecutionState,
    pub timestamp: DateTime<Utc>,
}

/// Everything a stage, producer or post-process hook can hand to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Create(CreateEntityRequest),
    Patch(PatchRequest),
    Delete(DeleteEntity),
    Lineage(AddLineageRequest),
    PipelineStatus(PipelineStatusRecord),
}

impl Record {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Record::Create(request) => request.entity_type,
            Record::Patch(patch) => patch.updated.entity_type,
            Record::Delete(delete) => delete.entity_type,
            Record::Lineage(_) => EntityType::Lineage,
            Record::PipelineStatus(_) => EntityType::PipelineStatus,
        }
    }

    /// Key used in status bookkeeping.
    pub fn key(&self) -> String {
        match self {
            Record::Create(request) => request.name.clone(),
            Record::Patch(patch) => patch.updated.name.clone(),
            Record::Delete(delete) => delete.fqn.to_string(),
            Record::Lineage(lineage) => format!("{} -> {}", lineage.from.fqn, lineage.to.fqn),
            Record::PipelineStatus(status) => status.pipeline_fqn.to_string(),
        }
    }
}

impl From<CreateEntityRequest> for Record {
    fn from(request: CreateEntityRequest) -> Self {
        Record::Create(request)
    }
}

impl From<AddLineageRequest> for Record {
    fn from(lineage: AddLineageRequest) -> Self {
        Record::Lineage(lineage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keys() {
        let table = CreateEntityRequest::new(EntityType::Table, "orders", None);
        assert_eq!(Record::from(table.clone()).key(), "orders");

        let lineage = AddLineageRequest {
            from: EntityRef::new(EntityType::Table, "a", Fqn::build(&["s", "a"])),
            to: EntityRef::new(EntityType::Table, "b", Fqn::build(&["s", "b"])),
            description: None,
        };
        assert_eq!(Record::from(lineage).key(), "s.a -> s.b");

        let delete = Record::Delete(DeleteEntity {
            entity_type: EntityType::Table,
            fqn: Fqn::build(&["s", "c"]),
            soft_delete: true,
        });
        assert_eq!(delete.key(), "s.c");
        assert_eq!(delete.entity_type(), EntityType::Table);
    }

    #[test]
    fn test_record_serializes_with_kind_tag() {
        let record = Record::from(CreateEntityRequest::new(EntityType::Topic, "events", None));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "create");
        assert_eq!(json["entity_type"], "topic");
    }
}
