// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Database family: service → database → schema → {table, stored procedure}.

use crate::engine::mark_deleted_under_seen;
use crate::errors::ValidationError;
use crate::models::{EntityType, StackTraceError};
use crate::topology::{
    no_records, single, ContextKey, HookContext, IngestionScope, Produce, StageOutput, StageSpec,
    Topology, TopologyNode,
};
use crate::traits::{Connector, ServiceSpec};

/// Capabilities of a database connector.
///
/// Raw item types are connector-defined; the topology only moves them from a
/// producer to the processors of the same node.
pub trait DatabaseServiceSource: Connector + Sized + 'static {
    type Database: 'static;
    type Schema: 'static;
    type Table: 'static;
    type StoredProcedure: 'static;

    fn yield_database_service<'a>(
        &'a self,
        service: &'a ServiceSpec,
        _scope: &IngestionScope,
    ) -> StageOutput<'a> {
        single(|| {
            Ok::<_, StackTraceError>(service.create_request(EntityType::DatabaseService).into())
        })
    }

    fn get_database_names<'a>(&'a self, scope: &IngestionScope) -> Produce<'a, Self::Database>;

    fn yield_database<'a>(
        &'a self,
        database: &'a Self::Database,
        scope: &IngestionScope,
    ) -> StageOutput<'a>;

    fn get_database_schema_names<'a>(&'a self, scope: &IngestionScope)
        -> Produce<'a, Self::Schema>;

    fn yield_database_schema<'a>(
        &'a self,
        schema: &'a Self::Schema,
        scope: &IngestionScope,
    ) -> StageOutput<'a>;

    fn get_tables_name_and_type<'a>(&'a self, scope: &IngestionScope) -> Produce<'a, Self::Table>;

    fn yield_table<'a>(
        &'a self,
        table: &'a Self::Table,
        scope: &IngestionScope,
    ) -> StageOutput<'a>;

    /// Lineage implied by constraints such as foreign keys.
    fn yield_table_constraints<'a>(
        &'a self,
        _table: &'a Self::Table,
        _scope: &IngestionScope,
    ) -> StageOutput<'a> {
        no_records()
    }

    fn get_stored_procedures<'a>(
        &'a self,
        scope: &IngestionScope,
    ) -> Produce<'a, Self::StoredProcedure>;

    fn yield_stored_procedure<'a>(
        &'a self,
        procedure: &'a Self::StoredProcedure,
        scope: &IngestionScope,
    ) -> StageOutput<'a>;

    /// Runs once the whole service has been walked.
    fn yield_view_lineage<'a>(&'a self, _context: &'a HookContext<'a>) -> StageOutput<'a> {
        no_records()
    }

    fn mark_tables_as_deleted<'a>(&'a self, context: &'a HookContext<'a>) -> StageOutput<'a> {
        mark_deleted_under_seen(
            self.source_config(),
            context,
            EntityType::Table,
            EntityType::DatabaseSchema,
            ContextKey::Database,
        )
    }

    fn mark_stored_procedures_as_deleted<'a>(
        &'a self,
        context: &'a HookContext<'a>,
    ) -> StageOutput<'a> {
        mark_deleted_under_seen(
            self.source_config(),
            context,
            EntityType::StoredProcedure,
            EntityType::DatabaseSchema,
            ContextKey::Database,
        )
    }
}

pub fn database_topology<C: DatabaseServiceSource>() -> Result<Topology<C>, Vec<ValidationError>> {
    let service = TopologyNode::<C>::builder::<ServiceSpec>("database_service", C::get_services)
        .stage(
            StageSpec::new("yield_database_service", EntityType::DatabaseService)
                .context(ContextKey::DatabaseService)
                .keep_existing(),
            C::yield_database_service,
        )
        .child("database")
        .post_process("yield_view_lineage", C::yield_view_lineage)
        .build();

    let database = TopologyNode::<C>::builder::<C::Database>("database", C::get_database_names)
        .stage(
            StageSpec::new("yield_database", EntityType::Database)
                .context(ContextKey::Database)
                .consumes(&[ContextKey::DatabaseService])
                .use_cache(),
            C::yield_database,
        )
        .child("database_schema")
        .build();

    let schema =
        TopologyNode::<C>::builder::<C::Schema>("database_schema", C::get_database_schema_names)
            .stage(
                StageSpec::new("yield_database_schema", EntityType::DatabaseSchema)
                    .context(ContextKey::DatabaseSchema)
                    .consumes(&[ContextKey::DatabaseService, ContextKey::Database])
                    .use_cache()
                    .track_deletion(),
                C::yield_database_schema,
            )
            .child("table")
            .child("stored_procedure")
            .post_process("mark_tables_as_deleted", C::mark_tables_as_deleted)
            .post_process(
                "mark_stored_procedures_as_deleted",
                C::mark_stored_procedures_as_deleted,
            )
            .build();

    let table = TopologyNode::<C>::builder::<C::Table>("table", C::get_tables_name_and_type)
        .stage(
            StageSpec::new("yield_table", EntityType::Table)
                .context(ContextKey::Table)
                .consumes(&[
                    ContextKey::DatabaseService,
                    ContextKey::Database,
                    ContextKey::DatabaseSchema,
                ])
                .use_cache()
                .track_deletion(),
            C::yield_table,
        )
        .stage(
            StageSpec::new("yield_table_constraints", EntityType::Lineage)
                .consumes(&[ContextKey::Table])
                .nullable(),
            C::yield_table_constraints,
        )
        .cache_all()
        .build();

    let stored_procedure =
        TopologyNode::<C>::builder::<C::StoredProcedure>("stored_procedure", C::get_stored_procedures)
            .stage(
                StageSpec::new("yield_stored_procedure", EntityType::StoredProcedure)
                    .context(ContextKey::StoredProcedure)
                    .consumes(&[ContextKey::DatabaseSchema])
                    .use_cache()
                    .track_deletion(),
                C::yield_stored_procedure,
            )
            .nullable()
            .cache_all()
            .build();

    Topology::new(
        "database_service",
        vec![service, database, schema, table, stored_procedure],
    )
}
