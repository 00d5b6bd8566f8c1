// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Depth-first topology runner.
//!
//! The runner walks a validated [`Topology`] from its root. For every node it
//! pulls raw items from the node's producer one at a time; for every item it runs
//! the node's stages in declared order, hands successful records to the sink,
//! publishes them in the [`IngestionScope`], records failures in the [`Status`]
//! and then recurses into the node's children. When a node is done for one parent
//! item its post-process hooks run.
//!
//! A failing record never stops the walk. Only an [`ExecutionError`] (a topology
//! that references a node it does not contain) aborts it, and a panic inside a
//! connector propagates unchanged.

use crate::engine::cache::FingerprintCache;
use crate::engine::deletion::SourceState;
use crate::engine::stop::StopSignal;
use crate::errors::ExecutionError;
use crate::models::{
    CatalogEntity, CreateEntityRequest, Either, EntityRef, EntityType, Fqn, PatchRequest, Record,
    StackTraceError, Status,
};
use crate::observability::messages::engine::{
    CachePrefetchFailed, ChildrenSkipped, NodeProducedNothing, NodeVisitStarted, RecordFailed,
    RecordFiltered, RecordUnchanged, RunInterrupted, SinkWriteFailed, TopologyRunCompleted,
    TopologyRunStarted,
};
use crate::observability::messages::StructuredLog;
use crate::topology::{
    BoundItem, HookContext, IngestionScope, ItemVisitor, StageOutput, StageSpec, Topology,
    TopologyNode,
};
use crate::traits::{MetadataCatalog, Sink};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    pub stop_signal: StopSignal,
}

/// Everything a run leaves behind.
#[derive(Debug)]
pub struct RunReport {
    pub status: Status,
    pub source_state: SourceState,
    /// The stop signal ended the walk before it was complete.
    pub interrupted: bool,
}

/// Walk `topology` with `connector`, sending accepted records to `sink`.
pub fn run_topology<C>(
    topology: &Topology<C>,
    connector: &C,
    scope: &mut IngestionScope,
    sink: &mut dyn Sink,
    catalog: &dyn MetadataCatalog,
    options: RunnerOptions,
) -> Result<RunReport, ExecutionError> {
    let started = TopologyRunStarted {
        root: topology.root(),
        node_count: topology.len(),
    };
    started.log();
    let _span = started.span("run_topology").entered();
    let start_time = Instant::now();

    let mut runner = TopologyRunner {
        topology,
        connector,
        scope,
        sink,
        catalog,
        cache: FingerprintCache::new(),
        source_state: SourceState::new(),
        status: Status::new(),
        stop: options.stop_signal,
        interrupted: false,
    };
    runner.visit_node(topology.root())?;

    let report = RunReport {
        status: runner.status,
        source_state: runner.source_state,
        interrupted: runner.interrupted,
    };
    TopologyRunCompleted {
        records: report.status.records.len(),
        updated: report.status.updated_records.len(),
        failures: report.status.failures.len(),
        filtered: report.status.filtered.len(),
        interrupted: report.interrupted,
        duration: start_time.elapsed(),
    }
    .log();

    Ok(report)
}

struct TopologyRunner<'r, C> {
    topology: &'r Topology<C>,
    connector: &'r C,
    scope: &'r mut IngestionScope,
    sink: &'r mut dyn Sink,
    catalog: &'r dyn MetadataCatalog,
    cache: FingerprintCache,
    source_state: SourceState,
    status: Status,
    stop: StopSignal,
    interrupted: bool,
}

/// How an accepted create request reaches the sink.
enum Delivery {
    Create(Record),
    Update(Record),
    Unchanged,
    Reused,
}

impl<'r, C> TopologyRunner<'r, C> {
    fn stop_requested(&mut self, before: &str) -> bool {
        if !self.interrupted && self.stop.is_stopped() {
            RunInterrupted { before }.log();
            self.interrupted = true;
        }
        self.interrupted
    }

    fn visit_node(&mut self, name: &str) -> Result<(), ExecutionError> {
        if self.stop_requested(name) {
            return Ok(());
        }

        let topology = self.topology;
        let node = topology.node(name)?;
        let visit_started = NodeVisitStarted {
            node: &node.name,
            stage_count: node.stages.len(),
        };
        visit_started.log();
        let _span = visit_started.span("visit_node").entered();

        // Values left by this node under a previous parent item must not be
        // read by a later sibling under this one.
        for key in node.context_keys() {
            self.scope.clear(key);
        }
        if node.cache_all {
            self.prefetch(node);
        }

        let connector = self.connector;
        let mut visit = NodeVisit {
            successes: vec![0; node.stages.len()],
            items: 0,
            runner: &mut *self,
            node,
        };
        node.driver.drive(connector, &mut visit)?;
        let NodeVisit {
            items, successes, ..
        } = visit;

        if !self.interrupted {
            self.check_node_results(node, items, &successes);
        }
        if node.clear_cache {
            for key in node.context_keys() {
                self.scope.clear(key);
            }
        }
        self.run_post_process(node);
        Ok(())
    }

    fn check_node_results(&mut self, node: &TopologyNode<C>, items: usize, successes: &[usize]) {
        if items == 0 {
            if !node.nullable {
                NodeProducedNothing { node: &node.name }.log();
                self.status
                    .warning(node.name.as_str(), "producer returned no items");
            }
            return;
        }

        for (stage, &count) in node.stages.iter().zip(successes) {
            if count == 0 && !stage.nullable {
                let name = stage_name(node, stage);
                RecordFailed {
                    name: &name,
                    error: "returned no results",
                }
                .log();
                self.status.failure(name, "returned no results", None);
            }
        }
    }

    fn prefetch(&mut self, node: &TopologyNode<C>) {
        for stage in node.stages.iter().filter(|stage| stage.use_cache) {
            let parent = stage
                .consumer
                .last()
                .and_then(|key| self.scope.fqn(*key).ok())
                .cloned();
            if let Err(error) = self
                .cache
                .prefetch(self.catalog, stage.entity_type, parent.as_ref())
            {
                CachePrefetchFailed {
                    node: &node.name,
                    error: &error,
                }
                .log();
            }
        }
    }

    fn run_post_process(&mut self, node: &TopologyNode<C>) {
        for hook in &node.post_process {
            if self.stop_requested(hook.name) {
                return;
            }
            let context = HookContext {
                scope: &*self.scope,
                source_state: &self.source_state,
                catalog: self.catalog,
            };
            for result in (hook.run)(self.connector, &context) {
                match result {
                    Ok(record) => deliver(&mut *self.sink, &mut self.status, &record, false),
                    Err(error) => record_failure(&mut self.status, error),
                }
            }
        }
    }

    /// Route every record of one stage call as it is pulled. Returns the number
    /// of successes.
    fn handle_output(&mut self, node: &str, stage: &StageSpec, output: StageOutput<'_>) -> usize {
        let mut successes = 0;
        for result in output {
            match result.and_then(|record| self.accept(node, stage, record)) {
                Ok(()) => successes += 1,
                Err(error) => record_failure(&mut self.status, error),
            }
        }
        successes
    }

    fn accept(&mut self, node: &str, stage: &StageSpec, record: Record) -> Either<()> {
        if record.entity_type() != stage.entity_type {
            return Err(StackTraceError::new(
                format!("{}.{}", node, stage.processor),
                format!(
                    "yielded a {} record where {} was declared",
                    record.entity_type(),
                    stage.entity_type
                ),
            ));
        }

        match record {
            Record::Create(request) => self.accept_create(stage, request),
            Record::Patch(patch) => {
                let entity = patch.updated.entity_ref();
                if stage.acks_sink {
                    self.send(&Record::Patch(patch), true);
                }
                self.publish(stage, entity);
                Ok(())
            }
            other => {
                if stage.acks_sink {
                    self.send(&other, false);
                }
                Ok(())
            }
        }
    }

    fn accept_create(&mut self, stage: &StageSpec, mut request: CreateEntityRequest) -> Either<()> {
        let existing = if stage.use_cache || !stage.overwrite {
            self.lookup(request.entity_type, &request.fqn)?
        } else {
            None
        };

        if stage.use_cache && request.source_hash.is_none() {
            request.source_hash = Some(request.fingerprint());
        }

        let delivery = match existing {
            Some(existing) if !stage.overwrite => {
                let entity = existing.entity_ref();
                self.publish(stage, entity);
                Delivery::Reused
            }
            Some(existing) if stage.use_cache => {
                if !existing.deleted && existing.source_hash == request.source_hash {
                    RecordUnchanged {
                        fqn: request.fqn.as_str(),
                    }
                    .log();
                    Delivery::Unchanged
                } else {
                    Delivery::Update(Record::Patch(PatchRequest {
                        original: existing,
                        updated: request.clone(),
                    }))
                }
            }
            _ => Delivery::Create(Record::Create(request.clone())),
        };

        if stage.acks_sink {
            match &delivery {
                Delivery::Create(record) => self.send(record, false),
                Delivery::Update(record) => self.send(record, true),
                Delivery::Unchanged => self.status.scanned(request.name.as_str()),
                Delivery::Reused => {}
            }
        }
        if !matches!(delivery, Delivery::Reused) {
            self.publish(stage, request.entity_ref());
        }
        Ok(())
    }

    fn lookup(&self, entity_type: EntityType, fqn: &Fqn) -> Either<Option<CatalogEntity>> {
        if let Some(hit) = self.cache.lookup(entity_type, fqn) {
            return Ok(hit.cloned());
        }
        self.catalog
            .get_by_name(entity_type, fqn)
            .map_err(|error| StackTraceError::from_error(fqn.to_string(), &error))
    }

    fn send(&mut self, record: &Record, updated: bool) {
        deliver(&mut *self.sink, &mut self.status, record, updated);
    }

    fn publish(&mut self, stage: &StageSpec, entity: EntityRef) {
        if stage.track_deletion {
            self.source_state
                .register(entity.entity_type, entity.fqn.clone());
        }
        if let Some(key) = stage.context {
            if stage.store_all_in_context {
                self.scope.append(key, entity);
            } else {
                self.scope.set(key, entity);
            }
        }
    }
}

fn deliver(sink: &mut dyn Sink, status: &mut Status, record: &Record, updated: bool) {
    if let Err(error) = sink.write_record(record) {
        SinkWriteFailed {
            record: &error.name,
            error: &error.error,
        }
        .log();
    }
    if updated {
        status.updated(record.key());
    } else {
        status.scanned(record.key());
    }
}

fn record_failure(status: &mut Status, error: StackTraceError) {
    RecordFailed {
        name: &error.name,
        error: &error.error,
    }
    .log();
    status.failed(error);
}

fn stage_name<C>(node: &TopologyNode<C>, stage: &StageSpec) -> String {
    format!("{}.{}", node.name, stage.processor)
}

/// Visitor for one node visit: runs stages per item and descends.
struct NodeVisit<'v, 'r, C> {
    runner: &'v mut TopologyRunner<'r, C>,
    node: &'r TopologyNode<C>,
    items: usize,
    successes: Vec<usize>,
}

impl<C> ItemVisitor<C> for NodeVisit<'_, '_, C> {
    fn scope(&self) -> &IngestionScope {
        &*self.runner.scope
    }

    fn interrupted(&self) -> bool {
        self.runner.interrupted || self.runner.stop.is_stopped()
    }

    fn filtered(&mut self, name: String, reason: String) {
        RecordFiltered {
            name: &name,
            reason: &reason,
        }
        .log();
        self.runner.status.filtered(name, reason);
    }

    fn producer_failed(&mut self, error: StackTraceError) {
        record_failure(&mut self.runner.status, error);
    }

    fn visit(&mut self, item: &dyn BoundItem<C>) -> Result<(), ExecutionError> {
        let node = self.node;
        let runner = &mut *self.runner;
        if runner.stop_requested(&node.name) {
            return Ok(());
        }
        self.items += 1;

        // Values from the previous item must never leak into this one.
        for key in node.item_keys() {
            runner.scope.clear(key);
        }

        let mut blocked_by: Option<&str> = None;
        for (index, stage) in node.stages.iter().enumerate() {
            let missing = stage
                .consumer
                .iter()
                .copied()
                .find(|key| !runner.scope.contains(*key));

            let produced = match missing {
                // A key this node writes itself is missing because an earlier
                // stage failed for this item; that failure is already recorded.
                Some(key) if node.context_keys().any(|own| own == key) => 0,
                Some(key) => {
                    record_failure(
                        &mut runner.status,
                        StackTraceError::new(
                            stage_name(node, stage),
                            ExecutionError::ContextNotPopulated { key }.to_string(),
                        ),
                    );
                    0
                }
                None => {
                    let output = item.run_stage(index, runner.connector, &*runner.scope);
                    runner.handle_output(&node.name, stage, output)
                }
            };

            self.successes[index] += produced;
            if produced == 0 && stage.context.is_some() && !stage.nullable {
                blocked_by.get_or_insert(stage.processor);
            }
        }

        if let Some(stage) = blocked_by {
            ChildrenSkipped {
                node: &node.name,
                stage,
            }
            .log();
        } else {
            for child in &node.children {
                runner.visit_node(child)?;
            }
        }

        for key in node
            .stages
            .iter()
            .filter(|stage| stage.clear_context)
            .filter_map(|stage| stage.context)
        {
            runner.scope.clear(key);
        }
        Ok(())
    }
}
