// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::CatalogError;
use crate::models::{CatalogEntity, EntityType, Fqn};

/// Read side of the metadata catalog, as the engine sees it.
///
/// Used for fingerprint comparisons, for reusing entities that must not be
/// overwritten, and to find stale entities during the deletion sweep. Soft
/// deleted entities are never returned.
pub trait MetadataCatalog {
    fn get_by_name(
        &self,
        entity_type: EntityType,
        fqn: &Fqn,
    ) -> Result<Option<CatalogEntity>, CatalogError>;

    /// Entities of `entity_type`, restricted to those below `parent` when given.
    fn list_entities(
        &self,
        entity_type: EntityType,
        parent: Option<&Fqn>,
    ) -> Result<Vec<CatalogEntity>, CatalogError>;
}
