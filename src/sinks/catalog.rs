// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Local, file-persisted metadata catalog and the sink that writes to it.
//!
//! The store is a single JSON document. [`LocalCatalog`] is a cheap handle onto
//! it: the workflow gives one handle to the runner (read side) and one to the
//! [`CatalogSink`] (write side), so records applied during a run are visible to
//! later fingerprint lookups of the same run.

use crate::errors::{CatalogError, SinkError};
use crate::models::{
    AddLineageRequest, CatalogEntity, Either, EntityType, Fqn, PipelineStatusRecord, Record,
    StackTraceError, Status,
};
use crate::traits::{MetadataCatalog, Sink};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogStore {
    #[serde(default)]
    entities: BTreeMap<EntityType, BTreeMap<Fqn, CatalogEntity>>,
    #[serde(default)]
    lineage: Vec<AddLineageRequest>,
    #[serde(default)]
    pipeline_status: Vec<PipelineStatusRecord>,
}

impl CatalogStore {
    pub fn apply(&mut self, record: &Record) {
        match record {
            Record::Create(request) => {
                self.upsert(CatalogEntity::from_request(request));
            }
            Record::Patch(patch) => {
                self.upsert(CatalogEntity::from_request(&patch.updated));
            }
            Record::Delete(delete) => {
                let entities = self.entities.entry(delete.entity_type).or_default();
                if delete.soft_delete {
                    if let Some(entity) = entities.get_mut(&delete.fqn) {
                        entity.deleted = true;
                    }
                } else {
                    entities.remove(&delete.fqn);
                }
            }
            Record::Lineage(lineage) => {
                let known = self
                    .lineage
                    .iter()
                    .any(|edge| edge.from.fqn == lineage.from.fqn && edge.to.fqn == lineage.to.fqn);
                if !known {
                    self.lineage.push(lineage.clone());
                }
            }
            Record::PipelineStatus(status) => self.pipeline_status.push(status.clone()),
        }
    }

    fn upsert(&mut self, entity: CatalogEntity) {
        self.entities
            .entry(entity.entity_type)
            .or_default()
            .insert(entity.fqn.clone(), entity);
    }

    /// Live (not soft deleted) entity by FQN.
    pub fn get(&self, entity_type: EntityType, fqn: &Fqn) -> Option<&CatalogEntity> {
        self.entities
            .get(&entity_type)
            .and_then(|entities| entities.get(fqn))
            .filter(|entity| !entity.deleted)
    }

    pub fn list(&self, entity_type: EntityType, parent: Option<&Fqn>) -> Vec<CatalogEntity> {
        self.entities
            .get(&entity_type)
            .into_iter()
            .flat_map(|entities| entities.values())
            .filter(|entity| !entity.deleted)
            .filter(|entity| parent.map_or(true, |parent| entity.fqn.is_child_of(parent)))
            .cloned()
            .collect()
    }

    /// Entity including soft deleted ones.
    pub fn get_any(&self, entity_type: EntityType, fqn: &Fqn) -> Option<&CatalogEntity> {
        self.entities.get(&entity_type).and_then(|entities| entities.get(fqn))
    }

    pub fn lineage(&self) -> &[AddLineageRequest] {
        &self.lineage
    }

    pub fn pipeline_status(&self) -> &[PipelineStatusRecord] {
        &self.pipeline_status
    }

    pub fn entity_count(&self) -> usize {
        self.entities.values().map(BTreeMap::len).sum()
    }
}

/// Shared handle onto a [`CatalogStore`], optionally backed by a JSON file.
#[derive(Debug, Clone, Default)]
pub struct LocalCatalog {
    path: Option<PathBuf>,
    store: Rc<RefCell<CatalogStore>>,
}

impl LocalCatalog {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store at `path`; a missing file is an empty catalog.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let store = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&content).map_err(|source| CatalogError::Corrupt {
                path: path.clone(),
                source,
            })?
        } else {
            CatalogStore::default()
        };

        Ok(Self {
            path: Some(path),
            store: Rc::new(RefCell::new(store)),
        })
    }

    pub fn apply(&self, record: &Record) -> Result<(), CatalogError> {
        self.store
            .try_borrow_mut()
            .map_err(|_| CatalogError::Busy)?
            .apply(record);
        Ok(())
    }

    /// Write the store back to its file; a no-op for in-memory catalogs.
    pub fn persist(&self) -> Result<(), CatalogError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let store = self.store.try_borrow().map_err(|_| CatalogError::Busy)?;
        let content = serde_json::to_string_pretty(&*store).map_err(|source| CatalogError::Corrupt {
            path: path.clone(),
            source,
        })?;
        fs::write(path, content).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })
    }

    /// Read access to the underlying store.
    pub fn with_store<T>(&self, read: impl FnOnce(&CatalogStore) -> T) -> Result<T, CatalogError> {
        let store = self.store.try_borrow().map_err(|_| CatalogError::Busy)?;
        Ok(read(&store))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl MetadataCatalog for LocalCatalog {
    fn get_by_name(
        &self,
        entity_type: EntityType,
        fqn: &Fqn,
    ) -> Result<Option<CatalogEntity>, CatalogError> {
        self.with_store(|store| store.get(entity_type, fqn).cloned())
    }

    fn list_entities(
        &self,
        entity_type: EntityType,
        parent: Option<&Fqn>,
    ) -> Result<Vec<CatalogEntity>, CatalogError> {
        self.with_store(|store| store.list(entity_type, parent))
    }
}

/// Sink that applies every record to a [`LocalCatalog`] and persists on close.
pub struct CatalogSink {
    catalog: LocalCatalog,
    status: Status,
}

impl CatalogSink {
    pub fn new(catalog: LocalCatalog) -> Self {
        Self {
            catalog,
            status: Status::new(),
        }
    }
}

impl Sink for CatalogSink {
    fn write_record(&mut self, record: &Record) -> Either<()> {
        match self.catalog.apply(record) {
            Ok(()) => {
                match record {
                    Record::Patch(_) => self.status.updated(record.key()),
                    _ => self.status.scanned(record.key()),
                }
                Ok(())
            }
            Err(error) => {
                let failure = StackTraceError::from_error(record.key(), &error);
                self.status.failed(failure.clone());
                Err(failure)
            }
        }
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.catalog.persist()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateEntityRequest, DeleteEntity, EntityRef};

    fn table(name: &str) -> CreateEntityRequest {
        CreateEntityRequest::new(EntityType::Table, name, Some(&Fqn::build(&["svc", "db", "public"])))
    }

    #[test]
    fn test_soft_delete_hides_entity() {
        let catalog = LocalCatalog::in_memory();
        let orders = table("orders");
        catalog.apply(&Record::Create(orders.clone())).unwrap();
        assert!(catalog.get_by_name(EntityType::Table, &orders.fqn).unwrap().is_some());

        catalog
            .apply(&Record::Delete(DeleteEntity {
                entity_type: EntityType::Table,
                fqn: orders.fqn.clone(),
                soft_delete: true,
            }))
            .unwrap();
        assert!(catalog.get_by_name(EntityType::Table, &orders.fqn).unwrap().is_none());
        assert!(catalog
            .with_store(|store| store.get_any(EntityType::Table, &orders.fqn).is_some())
            .unwrap());
    }

    #[test]
    fn test_list_filters_by_parent() {
        let catalog = LocalCatalog::in_memory();
        catalog.apply(&Record::Create(table("orders"))).unwrap();
        let other = CreateEntityRequest::new(
            EntityType::Table,
            "users",
            Some(&Fqn::build(&["svc", "db", "private"])),
        );
        catalog.apply(&Record::Create(other)).unwrap();

        let public = Fqn::build(&["svc", "db", "public"]);
        let listed = catalog.list_entities(EntityType::Table, Some(&public)).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "orders");
        assert_eq!(catalog.list_entities(EntityType::Table, None).unwrap().len(), 2);
    }

    #[test]
    fn test_persist_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let catalog = LocalCatalog::open(&path).unwrap();
        let mut sink = CatalogSink::new(catalog.clone());
        sink.write_record(&Record::Create(table("orders"))).unwrap();
        let edge = AddLineageRequest {
            from: EntityRef::new(EntityType::Table, "a", Fqn::build(&["svc", "a"])),
            to: EntityRef::new(EntityType::Table, "b", Fqn::build(&["svc", "b"])),
            description: None,
        };
        sink.write_record(&Record::Lineage(edge.clone())).unwrap();
        sink.write_record(&Record::Lineage(edge)).unwrap();
        sink.close().unwrap();
        assert_eq!(sink.status().records.len(), 3);

        let reopened = LocalCatalog::open(&path).unwrap();
        assert_eq!(reopened.with_store(|store| store.entity_count()).unwrap(), 1);
        assert_eq!(reopened.with_store(|store| store.lineage().len()).unwrap(), 1);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            LocalCatalog::open(&path),
            Err(CatalogError::Corrupt { .. })
        ));
    }
}
