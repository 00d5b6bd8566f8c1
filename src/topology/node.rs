// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Topology nodes and stages.
//!
//! A node pairs a *producer* (a connector method that lazily yields raw items,
//! e.g. table names) with an ordered list of *stages* (connector methods that turn
//! one raw item into zero or more records). Both are plain function pointers into a
//! typed connector trait, so a topology is checked by the compiler instead of being
//! resolved by method name at run time.
//!
//! Nodes have different raw item types (`String` for schema names, a vendor struct
//! for tables, ...). [`NodeDefinition`] keeps the item type and erases it behind
//! [`NodeDriver`], so a [`TopologyNode`] only depends on the connector type.

use crate::engine::SourceState;
use crate::errors::ExecutionError;
use crate::models::{EntityType, Either, Record, StackTraceError};
use crate::topology::context::{ContextKey, IngestionScope};
use crate::traits::MetadataCatalog;

/// Lazy, single-pass sequence of the records one stage or hook call produces.
/// The runner routes each result before pulling the next one.
pub type StageOutput<'a> = Box<dyn Iterator<Item = Either<Record>> + 'a>;

/// Lazy, single-pass sequence of raw items. It may borrow the connector but never
/// the scope: the runner mutates the scope between items.
pub type Produce<'a, I> = Box<dyn Iterator<Item = Either<Produced<I>>> + 'a>;

pub type Producer<C, I> = for<'a> fn(&'a C, &IngestionScope) -> Produce<'a, I>;

/// Stage body. The output may borrow the connector and the item but not the scope.
pub type Processor<C, I> = for<'a> fn(&'a C, &'a I, &IngestionScope) -> StageOutput<'a>;

pub type PostProcessFn<C> = for<'a> fn(&'a C, &'a HookContext<'a>) -> StageOutput<'a>;

/// One raw item from a producer, or the name of an item a filter pattern excluded.
#[derive(Debug, Clone, PartialEq)]
pub enum Produced<I> {
    Item(I),
    Filtered { name: String, reason: String },
}

impl<I> Produced<I> {
    pub fn filtered(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Produced::Filtered {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Run a fallible record builder and wrap its single result as a stage output.
///
/// Lets processors use `?` on context lookups:
/// `single(|| Ok(request_for(scope.database()?)))`.
pub fn single<F, E>(build: F) -> StageOutput<'static>
where
    F: FnOnce() -> Result<Record, E>,
    E: Into<StackTraceError>,
{
    let result: Either<Record> = build().map_err(Into::into);
    Box::new(std::iter::once(result))
}

/// Stage output for an item that yields nothing.
pub fn no_records() -> StageOutput<'static> {
    Box::new(std::iter::empty::<Either<Record>>())
}

/// Stage output holding one failure.
pub fn fail(error: impl Into<StackTraceError>) -> StageOutput<'static> {
    let result: Either<Record> = Err(error.into());
    Box::new(std::iter::once(result))
}

/// What a post-process hook can see once a node finished for one parent item.
pub struct HookContext<'a> {
    pub scope: &'a IngestionScope,
    pub source_state: &'a SourceState,
    pub catalog: &'a dyn MetadataCatalog,
}

/// Declarative half of a stage: everything the validator and the runner need
/// to know without calling the processor.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub processor: &'static str,
    pub entity_type: EntityType,
    pub context: Option<ContextKey>,
    pub consumer: Vec<ContextKey>,
    pub acks_sink: bool,
    pub nullable: bool,
    /// Append successes to a list in the scope instead of replacing the value.
    /// The list is emptied when the node is entered for a new parent item.
    pub store_all_in_context: bool,
    /// Drop the stage's context value once an item and its subtree are done.
    pub clear_context: bool,
    pub overwrite: bool,
    pub use_cache: bool,
    pub track_deletion: bool,
}

impl StageSpec {
    pub fn new(processor: &'static str, entity_type: EntityType) -> Self {
        Self {
            processor,
            entity_type,
            context: None,
            consumer: Vec::new(),
            acks_sink: true,
            nullable: false,
            store_all_in_context: false,
            clear_context: false,
            overwrite: true,
            use_cache: false,
            track_deletion: false,
        }
    }

    pub fn context(mut self, key: ContextKey) -> Self {
        self.context = Some(key);
        self
    }

    pub fn consumes(mut self, keys: &[ContextKey]) -> Self {
        self.consumer = keys.to_vec();
        self
    }

    pub fn no_ack(mut self) -> Self {
        self.acks_sink = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn store_all(mut self) -> Self {
        self.store_all_in_context = true;
        self
    }

    pub fn clear_context(mut self) -> Self {
        self.clear_context = true;
        self
    }

    pub fn keep_existing(mut self) -> Self {
        self.overwrite = false;
        self
    }

    pub fn use_cache(mut self) -> Self {
        self.use_cache = true;
        self
    }

    pub fn track_deletion(mut self) -> Self {
        self.track_deletion = true;
        self
    }
}

/// A named post-process hook.
pub struct PostProcess<C> {
    pub name: &'static str,
    pub run: PostProcessFn<C>,
}

impl<C> Clone for PostProcess<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            run: self.run,
        }
    }
}

/// Callback surface the runner hands to a [`NodeDriver`].
pub trait ItemVisitor<C> {
    fn scope(&self) -> &IngestionScope;

    /// Set once the stop signal fired; the driver stops pulling items.
    fn interrupted(&self) -> bool;

    fn filtered(&mut self, name: String, reason: String);

    fn producer_failed(&mut self, error: StackTraceError);

    fn visit(&mut self, item: &dyn BoundItem<C>) -> Result<(), ExecutionError>;
}

/// One raw item bound to its node's processors.
pub trait BoundItem<C> {
    fn run_stage<'s>(
        &'s self,
        index: usize,
        connector: &'s C,
        scope: &IngestionScope,
    ) -> StageOutput<'s>;
}

/// Type-erased producer plus processors of a node.
pub trait NodeDriver<C> {
    fn drive(&self, connector: &C, visitor: &mut dyn ItemVisitor<C>)
        -> Result<(), ExecutionError>;
}

/// Producer and processors of a node with a concrete raw item type.
pub struct NodeDefinition<C, I> {
    producer: Producer<C, I>,
    processors: Vec<Processor<C, I>>,
}

struct Bound<'a, C, I> {
    item: &'a I,
    processors: &'a [Processor<C, I>],
}

impl<C, I> BoundItem<C> for Bound<'_, C, I> {
    fn run_stage<'s>(
        &'s self,
        index: usize,
        connector: &'s C,
        scope: &IngestionScope,
    ) -> StageOutput<'s> {
        match self.processors.get(index) {
            Some(processor) => processor(connector, self.item, scope),
            None => no_records(),
        }
    }
}

impl<C, I> NodeDriver<C> for NodeDefinition<C, I> {
    fn drive(
        &self,
        connector: &C,
        visitor: &mut dyn ItemVisitor<C>,
    ) -> Result<(), ExecutionError> {
        let items = (self.producer)(connector, visitor.scope());
        for produced in items {
            if visitor.interrupted() {
                break;
            }
            match produced {
                Ok(Produced::Item(item)) => visitor.visit(&Bound {
                    item: &item,
                    processors: &self.processors,
                })?,
                Ok(Produced::Filtered { name, reason }) => visitor.filtered(name, reason),
                Err(error) => visitor.producer_failed(error),
            }
        }
        Ok(())
    }
}

/// A node of a topology, generic only over the connector.
pub struct TopologyNode<C> {
    pub name: String,
    pub children: Vec<String>,
    pub stages: Vec<StageSpec>,
    pub post_process: Vec<PostProcess<C>>,
    /// Empty production is expected; no warning when the producer yields nothing.
    pub nullable: bool,
    /// Prefetch catalog entities for the node's `use_cache` stages on entry.
    pub cache_all: bool,
    /// Drop the node's context values once it finished for a parent item.
    pub clear_cache: bool,
    pub(crate) driver: Box<dyn NodeDriver<C>>,
}

impl<C: 'static> TopologyNode<C> {
    pub fn builder<I: 'static>(
        name: impl Into<String>,
        producer: Producer<C, I>,
    ) -> NodeBuilder<C, I> {
        NodeBuilder {
            name: name.into(),
            producer,
            stages: Vec::new(),
            processors: Vec::new(),
            children: Vec::new(),
            post_process: Vec::new(),
            nullable: false,
            cache_all: false,
            clear_cache: false,
        }
    }
}

impl<C> TopologyNode<C> {
    /// Context keys written by this node's stages.
    pub fn context_keys(&self) -> impl Iterator<Item = ContextKey> + '_ {
        self.stages.iter().filter_map(|stage| stage.context)
    }

    /// Keys still set once the node finished for a parent item.
    pub fn retained_keys(&self) -> impl Iterator<Item = ContextKey> + '_ {
        self.stages
            .iter()
            .filter(|stage| !self.clear_cache && !stage.clear_context)
            .filter_map(|stage| stage.context)
    }

    /// Keys holding a single value per item; reset before every item.
    pub fn item_keys(&self) -> impl Iterator<Item = ContextKey> + '_ {
        self.stages
            .iter()
            .filter(|stage| !stage.store_all_in_context)
            .filter_map(|stage| stage.context)
    }

    /// Keys collecting every success of a visit; reset when the visit starts.
    pub fn list_keys(&self) -> impl Iterator<Item = ContextKey> + '_ {
        self.stages
            .iter()
            .filter(|stage| stage.store_all_in_context)
            .filter_map(|stage| stage.context)
    }
}

impl<C> std::fmt::Debug for TopologyNode<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyNode")
            .field("name", &self.name)
            .field("children", &self.children)
            .field("stages", &self.stages)
            .field(
                "post_process",
                &self.post_process.iter().map(|h| h.name).collect::<Vec<_>>(),
            )
            .field("nullable", &self.nullable)
            .field("cache_all", &self.cache_all)
            .field("clear_cache", &self.clear_cache)
            .finish()
    }
}

pub struct NodeBuilder<C, I> {
    name: String,
    producer: Producer<C, I>,
    stages: Vec<StageSpec>,
    processors: Vec<Processor<C, I>>,
    children: Vec<String>,
    post_process: Vec<PostProcess<C>>,
    nullable: bool,
    cache_all: bool,
    clear_cache: bool,
}

impl<C: 'static, I: 'static> NodeBuilder<C, I> {
    pub fn stage(mut self, spec: StageSpec, processor: Processor<C, I>) -> Self {
        self.stages.push(spec);
        self.processors.push(processor);
        self
    }

    pub fn child(mut self, name: impl Into<String>) -> Self {
        self.children.push(name.into());
        self
    }

    pub fn post_process(mut self, name: &'static str, run: PostProcessFn<C>) -> Self {
        self.post_process.push(PostProcess { name, run });
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn cache_all(mut self) -> Self {
        self.cache_all = true;
        self
    }

    pub fn clear_cache(mut self) -> Self {
        self.clear_cache = true;
        self
    }

    pub fn build(self) -> TopologyNode<C> {
        TopologyNode {
            name: self.name,
            children: self.children,
            stages: self.stages,
            post_process: self.post_process,
            nullable: self.nullable,
            cache_all: self.cache_all,
            clear_cache: self.clear_cache,
            driver: Box::new(NodeDefinition {
                producer: self.producer,
                processors: self.processors,
            }),
        }
    }
}
