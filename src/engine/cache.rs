// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Prefetched catalog entities for fingerprint comparisons.

use crate::errors::CatalogError;
use crate::models::{CatalogEntity, EntityType, Fqn};
use crate::traits::MetadataCatalog;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct FingerprintCache {
    entities: HashMap<(EntityType, Fqn), CatalogEntity>,
    /// Listings already loaded; `None` parent means every entity of the type.
    loaded: HashSet<(EntityType, Option<Fqn>)>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every entity of `entity_type` under `parent` with one listing call.
    pub fn prefetch(
        &mut self,
        catalog: &dyn MetadataCatalog,
        entity_type: EntityType,
        parent: Option<&Fqn>,
    ) -> Result<usize, CatalogError> {
        let listing = (entity_type, parent.cloned());
        if self.loaded.contains(&listing) {
            return Ok(0);
        }

        let entities = catalog.list_entities(entity_type, parent)?;
        let count = entities.len();
        for entity in entities {
            self.entities.insert((entity_type, entity.fqn.clone()), entity);
        }
        self.loaded.insert(listing);
        Ok(count)
    }

    /// `Some` when a prefetched listing covers `fqn`: the inner option tells
    /// whether the catalog had it. `None` means the catalog must be asked.
    pub fn lookup(&self, entity_type: EntityType, fqn: &Fqn) -> Option<Option<&CatalogEntity>> {
        if let Some(entity) = self.entities.get(&(entity_type, fqn.clone())) {
            return Some(Some(entity));
        }
        let covered = self.loaded.iter().any(|(loaded_type, parent)| {
            *loaded_type == entity_type
                && parent.as_ref().map_or(true, |parent| fqn.is_child_of(parent))
        });
        covered.then_some(None)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
