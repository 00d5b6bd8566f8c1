// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Entity identity: types, fully qualified names and create requests.
//!
//! The catalog's entity schema is treated as an opaque contract. A create request
//! carries the identity fields the engine needs (type, name, FQN, fingerprint) and
//! leaves everything vendor-specific inside a JSON `body`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};

/// Kind of record a stage produces.
///
/// Most variants are catalog entities; `Lineage` and `PipelineStatus` describe
/// records that hang off entities rather than entities themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    DatabaseService,
    Database,
    DatabaseSchema,
    Table,
    StoredProcedure,
    DashboardService,
    Dashboard,
    Chart,
    DashboardDataModel,
    PipelineService,
    Pipeline,
    MessagingService,
    Topic,
    MlModelService,
    MlModel,
    StorageService,
    Container,
    Lineage,
    PipelineStatus,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::DatabaseService => "databaseService",
            EntityType::Database => "database",
            EntityType::DatabaseSchema => "databaseSchema",
            EntityType::Table => "table",
            EntityType::StoredProcedure => "storedProcedure",
            EntityType::DashboardService => "dashboardService",
            EntityType::Dashboard => "dashboard",
            EntityType::Chart => "chart",
            EntityType::DashboardDataModel => "dashboardDataModel",
            EntityType::PipelineService => "pipelineService",
            EntityType::Pipeline => "pipeline",
            EntityType::MessagingService => "messagingService",
            EntityType::Topic => "topic",
            EntityType::MlModelService => "mlmodelService",
            EntityType::MlModel => "mlmodel",
            EntityType::StorageService => "storageService",
            EntityType::Container => "container",
            EntityType::Lineage => "lineage",
            EntityType::PipelineStatus => "pipelineStatus",
        }
    }

    /// Whether records of this type are stored in the catalog under an FQN.
    pub fn is_catalog_entity(&self) -> bool {
        !matches!(self, EntityType::Lineage | EntityType::PipelineStatus)
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully qualified name: the catalog's dotted-path identifier.
///
/// A part that itself contains a `.` is wrapped in double quotes so the path
/// stays unambiguous (`svc.db."my.schema".orders`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fqn(String);

impl Fqn {
    pub fn build<S: AsRef<str>>(parts: &[S]) -> Self {
        let quoted: Vec<String> = parts.iter().map(|p| quote_part(p.as_ref())).collect();
        Self(quoted.join("."))
    }

    /// Wrap an already formatted FQN string.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, quote_part(name)))
    }

    /// True when `self` lives strictly below `parent` in the hierarchy.
    pub fn is_child_of(&self, parent: &Fqn) -> bool {
        self.0.len() > parent.0.len()
            && self.0.starts_with(&parent.0)
            && self.0.as_bytes()[parent.0.len()] == b'.'
    }

    /// Split into unquoted parts.
    pub fn parts(&self) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = self.0.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '"' if in_quotes && chars.peek() == Some(&'"') => {
                    chars.next();
                    current.push('"');
                }
                '"' => in_quotes = !in_quotes,
                '.' if !in_quotes => parts.push(std::mem::take(&mut current)),
                _ => current.push(ch),
            }
        }
        parts.push(current);
        parts
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parts holding a dot or a quote are wrapped in quotes; inner quotes are doubled.
fn quote_part(part: &str) -> String {
    if part.contains(['.', '"']) {
        format!("\"{}\"", part.replace('"', "\"\""))
    } else {
        part.to_string()
    }
}

impl Display for Fqn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lightweight handle to an entity: what the ingestion scope stores and what
/// lineage edges point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub name: String,
    pub fqn: Fqn,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, name: impl Into<String>, fqn: Fqn) -> Self {
        Self {
            entity_type,
            name: name.into(),
            fqn,
        }
    }
}

/// Request to create (or upsert) an entity in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEntityRequest {
    pub entity_type: EntityType,
    pub name: String,
    pub fqn: Fqn,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub body: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
}

impl CreateEntityRequest {
    /// New request named `name` under `parent` (top-level services pass `None`).
    pub fn new(entity_type: EntityType, name: impl Into<String>, parent: Option<&Fqn>) -> Self {
        let name = name.into();
        let fqn = match parent {
            Some(parent) => parent.child(&name),
            None => Fqn::build(&[name.as_str()]),
        };
        Self {
            entity_type,
            name,
            fqn,
            display_name: None,
            description: None,
            body: serde_json::Value::Null,
            source_hash: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = body;
        self
    }

    /// SHA-256 over every field except `source_hash` itself.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::json!({
            "entity_type": self.entity_type,
            "name": self.name,
            "fqn": self.fqn,
            "display_name": self.display_name,
            "description": self.description,
            "body": self.body,
        });
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_type, self.name.clone(), self.fqn.clone())
    }
}
