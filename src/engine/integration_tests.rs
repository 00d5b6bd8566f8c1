// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runner tests against a small hand-written warehouse connector.

use crate::config::SourceConfig;
use crate::engine::{mark_deleted_under, run_topology, RunReport, RunnerOptions, StopSignal};
use crate::errors::ExecutionError;
use crate::models::{CreateEntityRequest, EntityType, Record, StackTraceError};
use crate::sinks::memory::MemorySink;
use crate::sinks::{CatalogSink, LocalCatalog};
use crate::topology::{
    fail, no_records, single, ContextKey, HookContext, IngestionScope, NodeBuilder, Produce,
    Produced, StageOutput, StageSpec, Topology, TopologyNode,
};
use crate::traits::{Connector, MetadataCatalog, ServiceSpec, Sink};
use std::cell::Cell;

struct Warehouse {
    service: ServiceSpec,
    config: SourceConfig,
    databases: Vec<String>,
    schemas: Vec<String>,
    tables: Vec<String>,
    failing: Vec<String>,
    filtered: Vec<String>,
    description: Option<String>,
    stop: Option<(String, StopSignal)>,
    built: Cell<usize>,
}

impl Warehouse {
    fn new(tables: &[&str]) -> Self {
        Self {
            service: ServiceSpec::new("warehouse", "test"),
            config: SourceConfig::default(),
            databases: vec!["db1".to_string()],
            schemas: vec!["public".to_string()],
            tables: tables.iter().map(|t| t.to_string()).collect(),
            failing: Vec::new(),
            filtered: Vec::new(),
            description: None,
            stop: None,
            built: Cell::new(0),
        }
    }

    fn failing(mut self, names: &[&str]) -> Self {
        self.failing = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

impl Connector for Warehouse {
    fn service(&self) -> &ServiceSpec {
        &self.service
    }

    fn source_config(&self) -> &SourceConfig {
        &self.config
    }
}

fn items<'a>(names: &'a [String]) -> Produce<'a, String> {
    Box::new(names.iter().map(|name| Ok(Produced::Item(name.clone()))))
}

fn databases<'a>(w: &'a Warehouse, _scope: &IngestionScope) -> Produce<'a, String> {
    items(&w.databases)
}

fn schemas<'a>(w: &'a Warehouse, _scope: &IngestionScope) -> Produce<'a, String> {
    items(&w.schemas)
}

fn tables<'a>(w: &'a Warehouse, _scope: &IngestionScope) -> Produce<'a, String> {
    Box::new(w.tables.iter().map(|name| {
        if w.filtered.contains(name) {
            Ok(Produced::filtered(name.as_str(), "excluded by table filter"))
        } else {
            Ok(Produced::Item(name.clone()))
        }
    }))
}

fn yield_database<'a>(
    _w: &'a Warehouse,
    name: &'a String,
    _scope: &IngestionScope,
) -> StageOutput<'a> {
    single(|| {
        Ok::<_, ExecutionError>(
            CreateEntityRequest::new(EntityType::Database, name.as_str(), None).into(),
        )
    })
}

fn yield_schema<'a>(
    _w: &'a Warehouse,
    name: &'a String,
    scope: &IngestionScope,
) -> StageOutput<'a> {
    single(|| {
        let database = scope.fqn(ContextKey::Database)?;
        Ok::<_, ExecutionError>(
            CreateEntityRequest::new(EntityType::DatabaseSchema, name.as_str(), Some(database))
                .into(),
        )
    })
}

fn yield_table<'a>(w: &'a Warehouse, name: &'a String, scope: &IngestionScope) -> StageOutput<'a> {
    if let Some((after, signal)) = &w.stop {
        if after == name {
            signal.stop();
        }
    }
    if w.failing.contains(name) {
        return fail(StackTraceError::new(name.as_str(), "KeyError: 'columns'"));
    }
    single(|| {
        let schema = scope.fqn(ContextKey::DatabaseSchema)?;
        Ok::<_, ExecutionError>(
            CreateEntityRequest::new(EntityType::Table, name.as_str(), Some(schema))
                .with_description(w.description.clone())
                .into(),
        )
    })
}

fn yield_no_records<'a>(
    _w: &'a Warehouse,
    _name: &'a String,
    _scope: &IngestionScope,
) -> StageOutput<'a> {
    no_records()
}

fn yield_column<'a>(
    _w: &'a Warehouse,
    name: &'a String,
    scope: &IngestionScope,
) -> StageOutput<'a> {
    single(|| {
        let table = scope.fqn(ContextKey::Table)?;
        let column = format!("{}_id", name);
        Ok::<_, ExecutionError>(
            CreateEntityRequest::new(EntityType::Table, column, Some(table)).into(),
        )
    })
}

fn yield_wrong_type<'a>(
    _w: &'a Warehouse,
    name: &'a String,
    _scope: &IngestionScope,
) -> StageOutput<'a> {
    let request = CreateEntityRequest::new(EntityType::Database, name.as_str(), None);
    Box::new(std::iter::once(Ok(Record::from(request))))
}

/// Three partitions per table, built one at a time as the runner pulls them.
fn yield_partitions<'a>(
    w: &'a Warehouse,
    name: &'a String,
    scope: &IngestionScope,
) -> StageOutput<'a> {
    let schema = match scope.fqn(ContextKey::DatabaseSchema) {
        Ok(schema) => schema.clone(),
        Err(error) => return fail(error),
    };
    Box::new((0..3).map(move |index| {
        w.built.set(w.built.get() + 1);
        let partition = format!("{}_p{}", name, index);
        let request = CreateEntityRequest::new(EntityType::Table, partition, Some(&schema));
        Ok::<_, StackTraceError>(Record::from(request))
    }))
}

fn procedures<'a>(_w: &'a Warehouse, _scope: &IngestionScope) -> Produce<'a, String> {
    Box::new(std::iter::once(Ok(Produced::Item("p".to_string()))))
}

fn yield_procedure<'a>(
    _w: &'a Warehouse,
    name: &'a String,
    scope: &IngestionScope,
) -> StageOutput<'a> {
    single(|| {
        let table = scope.fqn(ContextKey::Table)?;
        Ok::<_, ExecutionError>(
            CreateEntityRequest::new(EntityType::StoredProcedure, name.as_str(), Some(table))
                .into(),
        )
    })
}

fn mark_tables_as_deleted<'a>(w: &'a Warehouse, context: &'a HookContext<'a>) -> StageOutput<'a> {
    mark_deleted_under(
        &w.config,
        context,
        EntityType::Table,
        Some(ContextKey::DatabaseSchema),
    )
}

fn database_node() -> TopologyNode<Warehouse> {
    TopologyNode::<Warehouse>::builder::<String>("database", databases)
        .stage(
            StageSpec::new("yield_database", EntityType::Database)
                .context(ContextKey::Database)
                .no_ack(),
            yield_database,
        )
        .child("schema")
        .build()
}

fn schema_node() -> TopologyNode<Warehouse> {
    TopologyNode::<Warehouse>::builder::<String>("schema", schemas)
        .stage(
            StageSpec::new("yield_schema", EntityType::DatabaseSchema)
                .context(ContextKey::DatabaseSchema)
                .consumes(&[ContextKey::Database])
                .no_ack(),
            yield_schema,
        )
        .child("table")
        .build()
}

fn table_builder() -> NodeBuilder<Warehouse, String> {
    TopologyNode::<Warehouse>::builder::<String>("table", tables).stage(
        StageSpec::new("yield_table", EntityType::Table)
            .context(ContextKey::Table)
            .consumes(&[ContextKey::DatabaseSchema])
            .use_cache()
            .track_deletion(),
        yield_table,
    )
}

fn topology_with(table: TopologyNode<Warehouse>, extra: Vec<TopologyNode<Warehouse>>) -> Topology<Warehouse> {
    let mut nodes = vec![database_node(), schema_node(), table];
    nodes.extend(extra);
    Topology::new("database", nodes).unwrap()
}

fn default_topology() -> Topology<Warehouse> {
    topology_with(
        table_builder()
            .cache_all()
            .post_process("mark_tables_as_deleted", mark_tables_as_deleted)
            .build(),
        Vec::new(),
    )
}

fn run(topology: &Topology<Warehouse>, warehouse: &Warehouse) -> (RunReport, MemorySink, IngestionScope) {
    let catalog = LocalCatalog::in_memory();
    let mut scope = IngestionScope::new();
    let mut sink = MemorySink::new();
    let report = run_topology(
        topology,
        warehouse,
        &mut scope,
        &mut sink,
        &catalog,
        RunnerOptions::default(),
    )
    .unwrap();
    (report, sink, scope)
}

fn run_against(
    topology: &Topology<Warehouse>,
    warehouse: &Warehouse,
    catalog: &LocalCatalog,
) -> (RunReport, Vec<String>) {
    let mut scope = IngestionScope::new();
    let mut sink = CatalogSink::new(catalog.clone());
    let report = run_topology(
        topology,
        warehouse,
        &mut scope,
        &mut sink,
        catalog,
        RunnerOptions::default(),
    )
    .unwrap();
    let written = sink.status().records.clone();
    (report, written)
}

#[test]
fn test_failing_table_is_recorded_and_siblings_continue() {
    let warehouse = Warehouse::new(&["t1", "t2"]).failing(&["t2"]);
    let (report, sink, _) = run(&default_topology(), &warehouse);

    assert_eq!(report.status.records, vec!["t1"]);
    assert_eq!(report.status.failure_names(), vec!["t2"]);
    assert_eq!(sink.keys(), vec!["t1"]);
    assert!(!report.interrupted);
}

#[test]
fn test_one_failing_item_among_many_across_branches() {
    let mut warehouse = Warehouse::new(&["t1", "t2", "t3", "t4", "t5"]).failing(&["t3"]);
    warehouse.schemas = vec!["public".to_string(), "sales".to_string()];
    let (report, _, _) = run(&default_topology(), &warehouse);

    assert_eq!(report.status.records.len(), 8);
    assert_eq!(report.status.failure_names(), vec!["t3", "t3"]);
    assert_eq!(report.source_state.len(), 8);
}

#[test]
fn test_nullable_stage_without_results_does_not_block_children() {
    let table = table_builder()
        .stage(
            StageSpec::new("yield_tags", EntityType::Table)
                .consumes(&[ContextKey::Table])
                .nullable(),
            yield_no_records,
        )
        .child("column")
        .build();
    let column = TopologyNode::<Warehouse>::builder::<String>("column", tables)
        .stage(
            StageSpec::new("yield_column", EntityType::Table).consumes(&[ContextKey::Table]),
            yield_column,
        )
        .build();
    let warehouse = Warehouse::new(&["t1"]);
    let (report, sink, _) = run(&topology_with(table, vec![column]), &warehouse);

    assert!(report.status.failures.is_empty());
    assert_eq!(sink.keys(), vec!["t1", "t1_id"]);
}

#[test]
fn test_non_nullable_stage_without_results_fails_once() {
    let table = table_builder()
        .stage(StageSpec::new("yield_tags", EntityType::Table), yield_no_records)
        .build();
    let warehouse = Warehouse::new(&["t1", "t2"]);
    let (report, _, _) = run(&topology_with(table, Vec::new()), &warehouse);

    assert_eq!(report.status.records, vec!["t1", "t2"]);
    assert_eq!(report.status.failure_names(), vec!["table.yield_tags"]);
    assert_eq!(report.status.failures[0].error, "returned no results");
}

#[test]
fn test_empty_producer_warns_unless_nullable() {
    let warehouse = Warehouse::new(&[]);
    let (report, _, _) = run(&default_topology(), &warehouse);

    assert!(report.status.failures.is_empty());
    assert_eq!(report.status.warnings.len(), 1);
    assert_eq!(report.status.warnings[0].name, "table");

    let nullable = topology_with(table_builder().nullable().build(), Vec::new());
    let (report, _, _) = run(&nullable, &warehouse);

    assert!(report.status.warnings.is_empty());
}

#[test]
fn test_unpopulated_consumer_is_a_failure() {
    let schema = TopologyNode::<Warehouse>::builder::<String>("schema", schemas)
        .stage(
            StageSpec::new("yield_schema", EntityType::DatabaseSchema)
                .context(ContextKey::DatabaseSchema)
                .consumes(&[ContextKey::Database])
                .nullable(),
            yield_no_records,
        )
        .child("table")
        .build();
    let topology = Topology::new(
        "database",
        vec![database_node(), schema, table_builder().build()],
    )
    .unwrap();
    let (report, sink, _) = run(&topology, &Warehouse::new(&["t1"]));

    assert!(sink.records.is_empty());
    assert_eq!(
        report.status.failure_names(),
        vec!["table.yield_table", "table.yield_table"]
    );

    assert!(report.status.failures[0].error.contains("database_schema"));
}

#[test]
fn test_context_does_not_leak_between_items() {
    let table = table_builder()
        .stage(
            StageSpec::new("yield_column", EntityType::Table).consumes(&[ContextKey::Table]),
            yield_column,
        )
        .build();
    let warehouse = Warehouse::new(&["t1", "t2"]).failing(&["t2"]);
    let (report, sink, _) = run(&topology_with(table, Vec::new()), &warehouse);

    assert_eq!(sink.keys(), vec!["t1", "t1_id"]);
    assert_eq!(report.status.failure_names(), vec!["t2"]);
}

#[test]
fn test_clear_cache_drops_node_values() {
    let warehouse = Warehouse::new(&["t1", "t2"]);
    let (_, _, scope) = run(&default_topology(), &warehouse);

    assert_eq!(scope.get(ContextKey::Table).unwrap().name, "t2");

    let clearing = topology_with(table_builder().clear_cache().build(), Vec::new());
    let (_, _, scope) = run(&clearing, &warehouse);

    assert!(!scope.contains(ContextKey::Table));
    assert!(scope.contains(ContextKey::DatabaseSchema));
}

#[test]
fn test_filtered_items_are_not_records_or_failures() {
    let mut warehouse = Warehouse::new(&["orders", "orders_tmp"]);
    warehouse.filtered = vec!["orders_tmp".to_string()];
    let (report, _, _) = run(&default_topology(), &warehouse);

    assert_eq!(report.status.records, vec!["orders"]);
    assert!(report.status.failures.is_empty());
    assert_eq!(report.status.filtered.len(), 1);
    assert_eq!(report.status.filtered[0].name, "orders_tmp");
}

#[test]
fn test_mismatched_entity_type_is_a_failure() {
    let table = TopologyNode::<Warehouse>::builder::<String>("table", tables)
        .stage(
            StageSpec::new("yield_wrong", EntityType::Table).nullable(),
            yield_wrong_type,
        )
        .build();
    let (report, sink, _) = run(&topology_with(table, Vec::new()), &Warehouse::new(&["t1"]));

    assert!(sink.records.is_empty());
    assert_eq!(report.status.failure_names(), vec!["table.yield_wrong"]);
}

#[test]
fn test_deletion_sweep_marks_unseen_tables() {
    let catalog = LocalCatalog::in_memory();
    let topology = default_topology();
    let (first, _) = run_against(&topology, &Warehouse::new(&["A", "B", "C"]), &catalog);

    assert_eq!(first.status.records, vec!["A", "B", "C"]);

    let (second, written) = run_against(&topology, &Warehouse::new(&["A", "B"]), &catalog);
    let deleted: Vec<&str> = second
        .status
        .records
        .iter()
        .filter(|key| key.ends_with(".C"))
        .map(String::as_str)
        .collect();
    assert_eq!(deleted, vec!["db1.public.C"]);
    assert_eq!(written, vec!["db1.public.C"]);

    let remaining = catalog.list_entities(EntityType::Table, None).unwrap();
    let names: Vec<&str> = remaining.iter().map(|t| t.name.as_str()).collect();

    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn test_deletion_sweep_respects_config() {
    let catalog = LocalCatalog::in_memory();
    let topology = default_topology();
    run_against(&topology, &Warehouse::new(&["A", "B", "C"]), &catalog);
    let mut warehouse = Warehouse::new(&["A"]);
    warehouse.config.mark_deleted_entities = false;
    let (report, written) = run_against(&topology, &warehouse, &catalog);

    assert!(written.is_empty());
    assert_eq!(report.status.records, vec!["A"]);
    assert_eq!(catalog.list_entities(EntityType::Table, None).unwrap().len(), 3);
}

#[test]
fn test_rerun_is_idempotent_and_skips_unchanged() {
    let catalog = LocalCatalog::in_memory();
    let topology = default_topology();
    let warehouse = Warehouse::new(&["t1", "t2"]).failing(&["t2"]);
    let (first, first_written) = run_against(&topology, &warehouse, &catalog);
    let (second, second_written) = run_against(&topology, &warehouse, &catalog);

    assert_eq!(first.status.records, second.status.records);
    assert_eq!(first.status.failure_names(), second.status.failure_names());
    assert_eq!(first_written, vec!["t1"]);
    assert!(second_written.is_empty());
}

#[test]
fn test_changed_fingerprint_produces_patch() {
    let catalog = LocalCatalog::in_memory();
    let topology = default_topology();
    run_against(&topology, &Warehouse::new(&["t1"]), &catalog);
    let mut changed = Warehouse::new(&["t1"]);
    changed.description = Some("orders placed online".to_string());
    let mut scope = IngestionScope::new();
    let mut sink = MemorySink::new();
    let report = run_topology(
        &topology,
        &changed,
        &mut scope,
        &mut sink,
        &catalog,
        RunnerOptions::default(),
    )
    .unwrap();

    assert_eq!(report.status.updated_records, vec!["t1"]);
    assert!(report.status.records.is_empty());
    match &sink.records[..] {
        [Record::Patch(patch)] => {
            assert_ne!(patch.original.source_hash, patch.updated.source_hash);
            assert_eq!(
                patch.updated.description.as_deref(),
                Some("orders placed online")
            );
        }
        other => panic!("expected a single patch, got {:?}", other),
    }
}

#[test]
fn test_existing_entity_reused_when_not_overwriting() {
    let catalog = LocalCatalog::in_memory();
    let existing = CreateEntityRequest::new(EntityType::Database, "db1", None)
        .with_description(Some("curated by hand".to_string()));
    catalog.apply(&Record::Create(existing)).unwrap();
    let database = TopologyNode::<Warehouse>::builder::<String>("database", databases)
        .stage(
            StageSpec::new("yield_database", EntityType::Database)
                .context(ContextKey::Database)
                .keep_existing(),
            yield_database,
        )
        .child("schema")
        .build();
    let topology = Topology::new(
        "database",
        vec![database, schema_node(), table_builder().build()],
    )
    .unwrap();
    let mut scope = IngestionScope::new();
    let mut sink = MemorySink::new();
    let report = run_topology(
        &topology,
        &Warehouse::new(&["t1"]),
        &mut scope,
        &mut sink,
        &catalog,
        RunnerOptions::default(),
    )
    .unwrap();

    assert_eq!(sink.keys(), vec!["t1"]);
    assert_eq!(report.status.records, vec!["t1"]);
    assert_eq!(scope.get(ContextKey::Database).unwrap().name, "db1");
}

#[test]
fn test_stop_signal_interrupts_between_items() {
    let signal = StopSignal::new();
    let mut warehouse = Warehouse::new(&["t1", "t2", "t3"]);
    warehouse.stop = Some(("t1".to_string(), signal.clone()));
    let catalog = LocalCatalog::in_memory();
    let mut scope = IngestionScope::new();
    let mut sink = MemorySink::new();
    let report = run_topology(
        &default_topology(),
        &warehouse,
        &mut scope,
        &mut sink,
        &catalog,
        RunnerOptions {
            stop_signal: signal,
        },
    )
    .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.status.records, vec!["t1"]);
    assert!(report.status.failures.is_empty());
}

#[test]
fn test_sink_rejections_stay_in_sink_status() {
    let catalog = LocalCatalog::in_memory();
    let mut scope = IngestionScope::new();
    let mut sink = MemorySink::rejecting(&["t2"]);
    let report = run_topology(
        &default_topology(),
        &Warehouse::new(&["t1", "t2"]),
        &mut scope,
        &mut sink,
        &catalog,
        RunnerOptions::default(),
    )
    .unwrap();

    assert!(report.status.failures.is_empty());
    assert_eq!(sink.status().failure_names(), vec!["t2"]);
    assert_eq!(sink.keys(), vec!["t1"]);
}

#[test]
#[should_panic(expected = "connector bug")]
fn test_panics_propagate() {
    fn explode<'a>(
        _w: &'a Warehouse,
        _name: &'a String,
        _scope: &IngestionScope,
    ) -> StageOutput<'a> {
        panic!("connector bug");
    }
    let table = TopologyNode::<Warehouse>::builder::<String>("table", tables)
        .stage(StageSpec::new("explode", EntityType::Table), explode)
        .build();
    run(&topology_with(table, Vec::new()), &Warehouse::new(&["t1"]));
}

/// Tables only exist in schema `s1`.
fn tables_in_s1<'a>(w: &'a Warehouse, scope: &IngestionScope) -> Produce<'a, String> {
    let in_s1 = scope
        .fqn(ContextKey::DatabaseSchema)
        .is_ok_and(|schema| schema.as_str().ends_with(".s1"));
    if in_s1 {
        tables(w, scope)
    } else {
        Box::new(std::iter::empty())
    }
}

#[test]
fn test_sibling_does_not_read_context_from_a_previous_parent() {
    let schema = TopologyNode::<Warehouse>::builder::<String>("schema", schemas)
        .stage(
            StageSpec::new("yield_schema", EntityType::DatabaseSchema)
                .context(ContextKey::DatabaseSchema)
                .consumes(&[ContextKey::Database])
                .no_ack(),
            yield_schema,
        )
        .child("table")
        .child("procedure")
        .build();
    let table = TopologyNode::<Warehouse>::builder::<String>("table", tables_in_s1)
        .stage(
            StageSpec::new("yield_table", EntityType::Table)
                .context(ContextKey::Table)
                .consumes(&[ContextKey::DatabaseSchema]),
            yield_table,
        )
        .nullable()
        .build();
    let procedure = TopologyNode::<Warehouse>::builder::<String>("procedure", procedures)
        .stage(
            StageSpec::new("yield_procedure", EntityType::StoredProcedure)
                .consumes(&[ContextKey::Table]),
            yield_procedure,
        )
        .build();
    let topology = Topology::new("database", vec![database_node(), schema, table, procedure])
        .unwrap();

    let mut warehouse = Warehouse::new(&["t1"]);
    warehouse.schemas = vec!["s1".to_string(), "s2".to_string()];
    let (report, sink, _) = run(&topology, &warehouse);

    let procedure_fqns: Vec<String> = sink
        .records
        .iter()
        .filter_map(|record| match record {
            Record::Create(request) if request.entity_type == EntityType::StoredProcedure => {
                Some(request.fqn.to_string())
            }
            _ => None,
        })
        .collect();
    assert_eq!(procedure_fqns, vec!["db1.s1.t1.p"]);
    assert!(report.status.failures.iter().any(|failure| {
        failure.name == "procedure.yield_procedure"
            && failure.error == "Context key 'table' has not been populated yet"
    }));
}

/// Sink that notes how many partitions the connector had built at each write.
struct BuiltAtWrite<'w> {
    built: &'w Cell<usize>,
    observed: Vec<usize>,
    status: crate::models::Status,
}

impl Sink for BuiltAtWrite<'_> {
    fn write_record(&mut self, record: &Record) -> crate::models::Either<()> {
        self.observed.push(self.built.get());
        self.status.scanned(record.key());
        Ok(())
    }

    fn status(&self) -> &crate::models::Status {
        &self.status
    }

    fn close(&mut self) -> Result<(), crate::errors::SinkError> {
        Ok(())
    }
}

#[test]
fn test_stage_records_reach_the_sink_one_at_a_time() {
    let table = TopologyNode::<Warehouse>::builder::<String>("table", tables)
        .stage(
            StageSpec::new("yield_partitions", EntityType::Table)
                .consumes(&[ContextKey::DatabaseSchema]),
            yield_partitions,
        )
        .build();
    let topology = topology_with(table, Vec::new());
    let warehouse = Warehouse::new(&["t1"]);
    let mut sink = BuiltAtWrite {
        built: &warehouse.built,
        observed: Vec::new(),
        status: crate::models::Status::new(),
    };
    let mut scope = IngestionScope::new();

    let report = run_topology(
        &topology,
        &warehouse,
        &mut scope,
        &mut sink,
        &LocalCatalog::in_memory(),
        RunnerOptions::default(),
    )
    .unwrap();

    assert!(report.status.failures.is_empty());
    assert_eq!(sink.observed, vec![1, 2, 3]);
    assert_eq!(sink.status.records, vec!["t1_p0", "t1_p1", "t1_p2"]);
}
