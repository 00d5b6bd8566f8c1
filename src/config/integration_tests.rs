// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The sample configs under `configs/` must keep loading and running.

use crate::config::{load_and_validate_config, LogLevel, SinkType};
use crate::engine::{run_topology, RunnerOptions};
use crate::models::{ExecutionState, Record};
use crate::sinks::memory::MemorySink;
use crate::sinks::LocalCatalog;
use crate::sources::dashboard::dashboard_topology;
use crate::sources::pipeline::pipeline_topology;
use crate::sources::sample_data::{SampleDashboardSource, SamplePipelineSource};
use crate::sources::SourceFactory;
use crate::topology::IngestionScope;
use std::path::PathBuf;

#[test]
fn test_sample_database_yaml_loading() {
    let config = load_and_validate_config("configs/sample-database.yaml").unwrap();

    assert_eq!(config.source.source_type, "sample-database");
    assert_eq!(config.source.service_name, "local_warehouse");
    assert_eq!(config.sink.sink_type, SinkType::MetadataCatalog);
    assert_eq!(config.catalog.path, PathBuf::from("target/metadata-catalog.json"));
    assert_eq!(config.workflow_config.success_threshold, 90.0);

    let tables = config.source.source_config.filter_patterns.table.as_ref().unwrap();
    assert!(tables.is_filtered("orders_tmp"));
    assert!(!tables.is_filtered("orders"));
}

#[test]
fn test_sample_dashboard_json_loading() {
    let config = load_and_validate_config("configs/sample-dashboard.json").unwrap();

    assert_eq!(config.sink.sink_type, SinkType::JsonLines);
    assert_eq!(config.sink.path, Some(PathBuf::from("target/dashboard-records.jsonl")));
    assert_eq!(config.workflow_config.logger_level, LogLevel::Debug);
    // Unset threshold falls back to the strict default.
    assert_eq!(config.workflow_config.success_threshold, 100.0);
    assert!(config.source.source_config.mark_deleted_entities);
}

#[test]
fn test_sample_pipeline_toml_loading() {
    let config = load_and_validate_config("configs/sample-pipeline.toml").unwrap();

    assert_eq!(config.source.source_type, "sample-pipeline");
    assert_eq!(config.workflow_config.logger_level, LogLevel::Warn);
    let pipelines = config.source.service_connection["pipelines"].as_array().unwrap();
    assert_eq!(pipelines.len(), 2);
    assert_eq!(pipelines[0]["tasks"][0]["downstream"][0], "load");
}

#[test]
fn test_every_sample_config_builds_a_source() {
    for path in [
        "configs/sample-database.yaml",
        "configs/sample-dashboard.json",
        "configs/sample-pipeline.toml",
    ] {
        let config = load_and_validate_config(path).unwrap();
        let source = SourceFactory::create_source(&config.source).unwrap();
        assert_eq!(source.source_type(), config.source.source_type);
    }
}

#[test]
fn test_sample_dashboard_config_runs() {
    let config = load_and_validate_config("configs/sample-dashboard.json").unwrap();
    let source = SampleDashboardSource::new(&config.source).unwrap();
    let mut sink = MemorySink::new();
    let mut scope = IngestionScope::new();

    let report = run_topology(
        &dashboard_topology::<SampleDashboardSource>().unwrap(),
        &source,
        &mut scope,
        &mut sink,
        &LocalCatalog::in_memory(),
        RunnerOptions::default(),
    )
    .unwrap();

    assert!(report.status.failures.is_empty());
    assert_eq!(report.status.filtered[0].name, "scratch_model");
    assert!(sink
        .keys()
        .contains(&"local_looker.orders_model -> local_looker.sales".to_string()));
}

#[test]
fn test_sample_pipeline_config_runs() {
    let config = load_and_validate_config("configs/sample-pipeline.toml").unwrap();
    let source = SamplePipelineSource::new(&config.source).unwrap();
    let mut sink = MemorySink::new();
    let mut scope = IngestionScope::new();

    let report = run_topology(
        &pipeline_topology::<SamplePipelineSource>().unwrap(),
        &source,
        &mut scope,
        &mut sink,
        &LocalCatalog::in_memory(),
        RunnerOptions::default(),
    )
    .unwrap();

    assert!(report.status.failures.is_empty());
    let states: Vec<ExecutionState> = sink
        .records
        .iter()
        .filter_map(|record| match record {
            Record::PipelineStatus(status) => Some(status.state),
            _ => None,
        })
        .collect();
    assert_eq!(states, vec![ExecutionState::Successful]);
}
