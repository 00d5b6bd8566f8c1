// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{SourceConfig, SourceSection};
use crate::errors::{ExecutionError, WorkflowError};
use crate::models::{
    AddLineageRequest, CreateEntityRequest, EntityRef, EntityType, Fqn, Record, StackTraceError,
};
use crate::sources::database::DatabaseServiceSource;
use crate::sources::sample_data::{
    parse_connection, produce_error, produce_filtered, simulated_failure, Named,
};
use crate::topology::{
    fail, no_records, single, ContextKey, HookContext, IngestionScope, Produce, StageOutput,
};
use crate::traits::{Connector, ServiceSpec};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SampleDatabaseConnection {
    #[serde(default)]
    pub databases: Vec<SampleDatabase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleDatabase {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schemas: Vec<SampleSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleSchema {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tables: Vec<SampleTable>,
    #[serde(default)]
    pub stored_procedures: Vec<SampleStoredProcedure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    #[default]
    Regular,
    View,
    External,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleTable {
    pub name: String,
    #[serde(default)]
    pub table_type: TableType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Vec<SampleColumn>,
    #[serde(default)]
    pub foreign_keys: Vec<SampleForeignKey>,
    /// Tables a view selects from, as `schema.table` within the same database.
    #[serde(default)]
    pub upstream: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleColumn {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleForeignKey {
    pub columns: Vec<String>,
    /// `table` in the same schema, or `schema.table`.
    pub references: String,
    #[serde(default)]
    pub referred_columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleStoredProcedure {
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl Named for SampleDatabase {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for SampleSchema {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for SampleTable {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for SampleStoredProcedure {
    fn name(&self) -> &str {
        &self.name
    }
}

pub struct SampleDatabaseSource {
    service: ServiceSpec,
    config: SourceConfig,
    connection: SampleDatabaseConnection,
}

impl SampleDatabaseSource {
    pub fn new(source: &SourceSection) -> Result<Self, WorkflowError> {
        Ok(Self {
            service: ServiceSpec::from_source(source),
            config: source.source_config.clone(),
            connection: parse_connection(source)?,
        })
    }

    fn database_in_scope(&self, scope: &IngestionScope) -> Result<&SampleDatabase, StackTraceError> {
        let name = &scope.database()?.name;
        self.connection
            .databases
            .iter()
            .find(|database| &database.name == name)
            .ok_or_else(|| StackTraceError::new(name.as_str(), "database is not declared"))
    }

    fn schema_in_scope(&self, scope: &IngestionScope) -> Result<&SampleSchema, StackTraceError> {
        let database = self.database_in_scope(scope)?;
        let name = &scope.database_schema()?.name;
        database
            .schemas
            .iter()
            .find(|schema| &schema.name == name)
            .ok_or_else(|| StackTraceError::new(name.as_str(), "schema is not declared"))
    }
}

/// `schema.table` (or a bare table name, relative to `schema`) below `database`.
fn table_fqn(database: &Fqn, schema: &Fqn, reference: &str) -> Fqn {
    match reference.split_once('.') {
        Some((schema_name, table)) => database.child(schema_name).child(table),
        None => schema.child(reference),
    }
}

impl Connector for SampleDatabaseSource {
    fn service(&self) -> &ServiceSpec {
        &self.service
    }

    fn source_config(&self) -> &SourceConfig {
        &self.config
    }
}

impl DatabaseServiceSource for SampleDatabaseSource {
    type Database = SampleDatabase;
    type Schema = SampleSchema;
    type Table = SampleTable;
    type StoredProcedure = SampleStoredProcedure;

    fn get_database_names<'a>(&'a self, _scope: &IngestionScope) -> Produce<'a, SampleDatabase> {
        produce_filtered(
            &self.connection.databases,
            self.config.filter_patterns.database.as_ref(),
            "database",
        )
    }

    fn yield_database<'a>(
        &'a self,
        database: &'a SampleDatabase,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        single(|| {
            let service = scope.fqn(ContextKey::DatabaseService)?;
            Ok::<_, ExecutionError>(
                CreateEntityRequest::new(EntityType::Database, database.name.as_str(), Some(service))
                    .with_description(database.description.clone())
                    .into(),
            )
        })
    }

    fn get_database_schema_names<'a>(
        &'a self,
        scope: &IngestionScope,
    ) -> Produce<'a, SampleSchema> {
        match self.database_in_scope(scope) {
            Ok(database) => produce_filtered(
                &database.schemas,
                self.config.filter_patterns.schema.as_ref(),
                "schema",
            ),
            Err(error) => produce_error(error),
        }
    }

    fn yield_database_schema<'a>(
        &'a self,
        schema: &'a SampleSchema,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        single(|| {
            let database = scope.fqn(ContextKey::Database)?;
            Ok::<_, ExecutionError>(
                CreateEntityRequest::new(EntityType::DatabaseSchema, schema.name.as_str(), Some(database))
                    .with_description(schema.description.clone())
                    .into(),
            )
        })
    }

    fn get_tables_name_and_type<'a>(&'a self, scope: &IngestionScope) -> Produce<'a, SampleTable> {
        match self.schema_in_scope(scope) {
            Ok(schema) => produce_filtered(
                &schema.tables,
                self.config.filter_patterns.table.as_ref(),
                "table",
            ),
            Err(error) => produce_error(error),
        }
    }

    fn yield_table<'a>(
        &'a self,
        table: &'a SampleTable,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        if let Some(failure) = simulated_failure(&table.name, &table.error) {
            return fail(failure);
        }
        single(|| {
            let schema = scope.fqn(ContextKey::DatabaseSchema)?;
            let columns: Vec<_> = table
                .columns
                .iter()
                .map(|column| {
                    json!({
                        "name": column.name,
                        "dataType": column.data_type,
                        "description": column.description,
                    })
                })
                .collect();
            Ok::<_, ExecutionError>(
                CreateEntityRequest::new(EntityType::Table, table.name.as_str(), Some(schema))
                    .with_description(table.description.clone())
                    .with_body(json!({ "tableType": table.table_type, "columns": columns }))
                    .into(),
            )
        })
    }

    fn yield_table_constraints<'a>(
        &'a self,
        table: &'a SampleTable,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        if table.foreign_keys.is_empty() {
            return no_records();
        }
        let (database, schema, current) = match (
            scope.fqn(ContextKey::Database),
            scope.fqn(ContextKey::DatabaseSchema),
            scope.get(ContextKey::Table),
        ) {
            (Ok(database), Ok(schema), Ok(current)) => {
                (database.clone(), schema.clone(), current.clone())
            }
            (Err(error), _, _) | (_, Err(error), _) | (_, _, Err(error)) => return fail(error),
        };

        Box::new(table.foreign_keys.iter().map(move |key| {
            let referenced = table_fqn(&database, &schema, &key.references);
            let name = referenced.parts().pop().unwrap_or_default();
            Ok::<_, StackTraceError>(Record::from(AddLineageRequest {
                from: EntityRef::new(EntityType::Table, name, referenced),
                to: current.clone(),
                description: Some(format!(
                    "foreign key ({}) references ({})",
                    key.columns.join(", "),
                    key.referred_columns.join(", ")
                )),
            }))
        }))
    }

    fn get_stored_procedures<'a>(
        &'a self,
        scope: &IngestionScope,
    ) -> Produce<'a, SampleStoredProcedure> {
        match self.schema_in_scope(scope) {
            Ok(schema) => produce_filtered(
                &schema.stored_procedures,
                self.config.filter_patterns.stored_procedure.as_ref(),
                "stored procedure",
            ),
            Err(error) => produce_error(error),
        }
    }

    fn yield_stored_procedure<'a>(
        &'a self,
        procedure: &'a SampleStoredProcedure,
        scope: &IngestionScope,
    ) -> StageOutput<'a> {
        if let Some(failure) = simulated_failure(&procedure.name, &procedure.error) {
            return fail(failure);
        }
        single(|| {
            let schema = scope.fqn(ContextKey::DatabaseSchema)?;
            Ok::<_, ExecutionError>(
                CreateEntityRequest::new(EntityType::StoredProcedure, procedure.name.as_str(), Some(schema))
                    .with_body(json!({ "language": procedure.language, "code": procedure.code }))
                    .into(),
            )
        })
    }

    /// Lineage from each view's upstream tables, for views ingested in this run.
    fn yield_view_lineage<'a>(&'a self, context: &'a HookContext<'a>) -> StageOutput<'a> {
        let service = match context.scope.fqn(ContextKey::DatabaseService) {
            Ok(service) => service,
            Err(error) => return fail(error),
        };

        let views = self.connection.databases.iter().flat_map(move |database| {
            let database_fqn = service.child(&database.name);
            database.schemas.iter().flat_map(move |schema| {
                let database_fqn = database_fqn.clone();
                let schema_fqn = database_fqn.child(&schema.name);
                schema
                    .tables
                    .iter()
                    .filter(|table| table.table_type == TableType::View)
                    .map(move |view| (database_fqn.clone(), schema_fqn.clone(), view))
            })
        });

        Box::new(
            views
                .filter_map(move |(database_fqn, schema_fqn, view)| {
                    let view_fqn = schema_fqn.child(&view.name);
                    context
                        .source_state
                        .contains(EntityType::Table, &view_fqn)
                        .then_some((database_fqn, schema_fqn, view, view_fqn))
                })
                .flat_map(|(database_fqn, schema_fqn, view, view_fqn)| {
                    view.upstream.iter().map(move |upstream| {
                        let from = table_fqn(&database_fqn, &schema_fqn, upstream);
                        let name = from.parts().pop().unwrap_or_default();
                        let to =
                            EntityRef::new(EntityType::Table, view.name.as_str(), view_fqn.clone());
                        Ok::<_, StackTraceError>(Record::from(AddLineageRequest {
                            from: EntityRef::new(EntityType::Table, name, from),
                            to,
                            description: Some("view definition".to_string()),
                        }))
                    })
                }),
        )
    }
}
