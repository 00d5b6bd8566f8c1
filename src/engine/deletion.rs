// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Staleness bookkeeping.
//!
//! During a run every successfully produced entity of a tracked stage is
//! registered in the [`SourceState`]. After a subtree finished, a sweep lists what
//! the catalog holds under the subtree's parent and emits a soft delete for every
//! entity the run did not see.

use crate::config::SourceConfig;
use crate::models::{CreateEntityRequest, DeleteEntity, EntityType, Fqn, Record, StackTraceError};
use crate::topology::{fail, no_records, ContextKey, HookContext, StageOutput};
use crate::traits::MetadataCatalog;
use std::collections::{BTreeMap, BTreeSet};

/// FQNs seen at the source during one run, per entity type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceState {
    seen: BTreeMap<EntityType, BTreeSet<Fqn>>,
}

impl SourceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_record(&mut self, request: &CreateEntityRequest) {
        self.register(request.entity_type, request.fqn.clone());
    }

    pub fn register(&mut self, entity_type: EntityType, fqn: Fqn) {
        self.seen.entry(entity_type).or_default().insert(fqn);
    }

    pub fn contains(&self, entity_type: EntityType, fqn: &Fqn) -> bool {
        self.seen
            .get(&entity_type)
            .is_some_and(|fqns| fqns.contains(fqn))
    }

    pub fn seen(&self, entity_type: EntityType) -> impl Iterator<Item = &Fqn> {
        self.seen.get(&entity_type).into_iter().flatten()
    }

    /// Total number of registered FQNs across all types.
    pub fn len(&self) -> usize {
        self.seen.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Soft delete every catalog entity of `entity_type` under `parent` that the
/// source state does not contain.
pub fn mark_entities_as_deleted<'a>(
    entity_type: EntityType,
    source_state: &'a SourceState,
    parent: Option<&Fqn>,
    catalog: &dyn MetadataCatalog,
) -> StageOutput<'a> {
    let existing = match catalog.list_entities(entity_type, parent) {
        Ok(existing) => existing,
        Err(error) => {
            let name = parent.map_or_else(|| entity_type.to_string(), Fqn::to_string);
            return fail(StackTraceError::from_error(name, &error));
        }
    };

    Box::new(
        existing
            .into_iter()
            .filter(move |entity| !source_state.contains(entity_type, &entity.fqn))
            .map(move |entity| {
                Ok::<_, StackTraceError>(Record::Delete(DeleteEntity {
                    entity_type,
                    fqn: entity.fqn,
                    soft_delete: true,
                }))
            }),
    )
}

/// Deletion sweep as a post-process hook body.
///
/// Does nothing unless `mark_deleted_entities` is enabled. The parent is read
/// from the scope under `parent_key`; `None` sweeps the whole type.
pub fn mark_deleted_under<'a>(
    config: &SourceConfig,
    context: &'a HookContext<'a>,
    entity_type: EntityType,
    parent_key: Option<ContextKey>,
) -> StageOutput<'a> {
    if !config.mark_deleted_entities {
        return no_records();
    }
    let parent = match parent_key.map(|key| context.scope.fqn(key)).transpose() {
        Ok(parent) => parent,
        Err(error) => return fail(error),
    };
    mark_entities_as_deleted(entity_type, context.source_state, parent, context.catalog)
}

/// Deletion sweep limited to the parents this run actually walked.
///
/// Sweeps `entity_type` below every seen `parent_type` FQN that lives under the
/// scope's `ancestor`. Parents excluded by a filter pattern were never registered,
/// so their children are left alone. The catalog is listed for one parent at a
/// time, as the sweep is pulled.
pub fn mark_deleted_under_seen<'a>(
    config: &SourceConfig,
    context: &'a HookContext<'a>,
    entity_type: EntityType,
    parent_type: EntityType,
    ancestor: ContextKey,
) -> StageOutput<'a> {
    if !config.mark_deleted_entities {
        return no_records();
    }
    let ancestor = match context.scope.fqn(ancestor) {
        Ok(ancestor) => ancestor,
        Err(error) => return fail(error),
    };
    let source_state = context.source_state;
    let catalog = context.catalog;
    Box::new(
        source_state
            .seen(parent_type)
            .filter(move |parent| parent.is_child_of(ancestor))
            .flat_map(move |parent| {
                mark_entities_as_deleted(entity_type, source_state, Some(parent), catalog)
            }),
    )
}
