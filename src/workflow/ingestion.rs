// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Workflow driver: config in, exit code out.
//!
//! An [`IngestionWorkflow`] owns one source, one sink and the local catalog.
//! `execute` walks the source topology once, `stop` releases the connector and
//! closes the sink, and the outcome is decided from both steps' statuses against
//! the configured success threshold.

use crate::config::consts::DEFAULT_JSON_LINES_PATH;
use crate::config::{validate_config, SinkConfig, SinkType, WorkflowConfig, WorkflowSettings};
use crate::engine::{RunReport, RunnerOptions, StopSignal};
use crate::errors::WorkflowError;
use crate::models::Status;
use crate::observability::messages::workflow::{
    CatalogOpened, SinkCloseFailed, SourceCreated, WorkflowCompleted, WorkflowStarted,
};
use crate::observability::messages::StructuredLog;
use crate::sinks::{CatalogSink, JsonLinesSink, LocalCatalog};
use crate::sources::SourceFactory;
use crate::traits::Sink;
use crate::workflow::WorkflowSource;
use std::fmt::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Success,
    SuccessWithWarnings,
    Failure,
}

impl WorkflowOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            WorkflowOutcome::Success | WorkflowOutcome::SuccessWithWarnings => 0,
            WorkflowOutcome::Failure => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowOutcome::Success => "finished successfully",
            WorkflowOutcome::SuccessWithWarnings => "succeeded with warnings",
            WorkflowOutcome::Failure => "failed",
        }
    }
}

/// Decide the outcome of a run from the statuses of its steps.
///
/// Any step below `success_threshold` percent fails the workflow, as does an
/// interrupted run. Failures above the threshold and warnings only downgrade a
/// success.
pub fn evaluate_outcome(
    steps: &[&Status],
    success_threshold: f64,
    interrupted: bool,
) -> WorkflowOutcome {
    if interrupted
        || steps
            .iter()
            .any(|status| status.calculate_success() < success_threshold)
    {
        WorkflowOutcome::Failure
    } else if steps
        .iter()
        .any(|status| status.has_failures() || status.has_warnings())
    {
        WorkflowOutcome::SuccessWithWarnings
    } else {
        WorkflowOutcome::Success
    }
}

pub struct IngestionWorkflow {
    service_name: String,
    source: Box<dyn WorkflowSource>,
    sink: Box<dyn Sink>,
    catalog: LocalCatalog,
    settings: WorkflowSettings,
    stop_signal: StopSignal,
    report: Option<RunReport>,
    duration: Duration,
    closed: bool,
}

impl IngestionWorkflow {
    /// Build the source, sink and catalog a config describes.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        validate_config(config)?;

        let catalog = LocalCatalog::open(&config.catalog.path)?;
        CatalogOpened {
            path: &config.catalog.path.display().to_string(),
            entities: catalog.with_store(|store| store.entity_count())?,
        }
        .log();

        let source = SourceFactory::create_source(&config.source)?;
        SourceCreated {
            source_type: source.source_type(),
            root: source.topology_root(),
            node_count: source.node_count(),
        }
        .log();

        let sink = create_sink(&config.sink, &catalog)?;
        Ok(Self::new(
            config.source.service_name.as_str(),
            source,
            sink,
            catalog,
            config.workflow_config.clone(),
        ))
    }

    pub fn new(
        service_name: impl Into<String>,
        source: Box<dyn WorkflowSource>,
        sink: Box<dyn Sink>,
        catalog: LocalCatalog,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            source,
            sink,
            catalog,
            settings,
            stop_signal: StopSignal::new(),
            report: None,
            duration: Duration::ZERO,
            closed: false,
        }
    }

    /// Handle for requesting a stop from another thread.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop_signal.clone()
    }

    /// Walk the source topology once.
    pub fn execute(&mut self) -> Result<(), WorkflowError> {
        if self.report.is_some() {
            return Err(WorkflowError::AlreadyExecuted);
        }

        let started = WorkflowStarted {
            source_type: self.source.source_type(),
            service_name: &self.service_name,
        };
        started.log();
        let _span = started.span("execute").entered();

        let start_time = Instant::now();
        let report = self.source.run(
            self.sink.as_mut(),
            &self.catalog,
            RunnerOptions {
                stop_signal: self.stop_signal.clone(),
            },
        )?;
        self.duration = start_time.elapsed();
        self.report = Some(report);

        let outcome = self.outcome();
        WorkflowCompleted {
            outcome: outcome.as_str(),
            success_percentage: self.success_percentage(),
            failures: self.failure_count(),
            warnings: self.warning_count(),
            duration: self.duration,
        }
        .log();
        Ok(())
    }

    /// Close the connector and the sink. Safe to call more than once.
    pub fn stop(&mut self) -> Result<(), WorkflowError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.source.close();
        if let Err(error) = self.sink.close() {
            SinkCloseFailed { error: &error }.log();
            return Err(error.into());
        }
        Ok(())
    }

    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    pub fn source_status(&self) -> Option<&Status> {
        self.report.as_ref().map(|report| &report.status)
    }

    pub fn sink_status(&self) -> &Status {
        self.sink.status()
    }

    fn steps(&self) -> Vec<&Status> {
        self.source_status()
            .into_iter()
            .chain(std::iter::once(self.sink.status()))
            .collect()
    }

    fn failure_count(&self) -> usize {
        self.steps().iter().map(|status| status.failures.len()).sum()
    }

    fn warning_count(&self) -> usize {
        self.steps().iter().map(|status| status.warnings.len()).sum()
    }

    /// Lowest success percentage across the steps.
    pub fn success_percentage(&self) -> f64 {
        self.steps()
            .iter()
            .map(|status| status.calculate_success())
            .fold(100.0, f64::min)
    }

    /// Outcome of the run; a workflow that never executed has failed.
    pub fn outcome(&self) -> WorkflowOutcome {
        match &self.report {
            Some(report) => evaluate_outcome(
                &self.steps(),
                self.settings.success_threshold,
                report.interrupted,
            ),
            None => WorkflowOutcome::Failure,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.outcome().exit_code()
    }

    /// Human-readable summary of both steps.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Workflow Summary");
        let _ = writeln!(out, "================");
        if let Some(status) = self.source_status() {
            write_step(&mut out, "Source", status);
        }
        write_step(&mut out, "Sink", self.sink.status());

        let failures: Vec<_> = self
            .steps()
            .into_iter()
            .flat_map(|status| status.failures.iter())
            .collect();
        if !failures.is_empty() {
            let _ = writeln!(out, "Failures:");
            for failure in failures {
                let _ = writeln!(out, "  - {}: {}", failure.name, failure.error);
            }
        }
        if self.report.as_ref().is_some_and(|report| report.interrupted) {
            let _ = writeln!(out, "Run was interrupted before the topology was complete");
        }
        let _ = writeln!(out, "Success %: {:.2}", self.success_percentage());
        let _ = writeln!(out, "Elapsed: {:.2?}", self.duration);
        let _ = writeln!(out, "Workflow {}", self.outcome().as_str());
        out
    }

    pub fn print_status(&self) {
        println!("{}", self.summary());
    }
}

fn write_step(out: &mut String, step: &str, status: &Status) {
    let _ = writeln!(
        out,
        "{}: {} records, {} updated, {} filtered, {} warnings, {} failures",
        step,
        status.records.len(),
        status.updated_records.len(),
        status.filtered.len(),
        status.warnings.len(),
        status.failures.len()
    );
    for warning in &status.warnings {
        let _ = writeln!(out, "  warning {}: {}", warning.name, warning.message);
    }
}

fn create_sink(
    config: &SinkConfig,
    catalog: &LocalCatalog,
) -> Result<Box<dyn Sink>, WorkflowError> {
    let sink: Box<dyn Sink> = match config.sink_type {
        SinkType::MetadataCatalog => Box::new(CatalogSink::new(catalog.clone())),
        SinkType::JsonLines => {
            let path = config
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_JSON_LINES_PATH));
            Box::new(JsonLinesSink::create(path)?)
        }
    };
    Ok(sink)
}
