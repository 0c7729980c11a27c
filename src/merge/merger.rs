//! The resolution engine.

use std::collections::btree_map::Entry;

use tracing::{debug, trace};

use super::processor::{MergeContext, MergingProcessor};
use crate::blue_id::calculate_blue_id;
use crate::error::{BlueError, Result};
use crate::extend::{MissingContentStrategy, NodeExtender};
use crate::limits::Limits;
use crate::model::Node;
use crate::provider::NodeProvider;
use crate::typing::DEFAULT_MAX_TYPE_CHAIN_DEPTH;

/// Default bound on nested resolve calls. Kept low enough to fail cleanly on a 2 MiB thread
/// stack.
pub const DEFAULT_MAX_NESTING: usize = 64;

/// Merges nodes with their type chains.
///
/// A `Merger` is cheap to build and holds per-call state (the type chain being walked), so
/// resolution takes `&mut self`. Build one per resolve call, or reuse one sequentially.
///
/// # Examples
///
/// ```
/// use blue_language::limits::Limits;
/// use blue_language::merge::{Merger, Pipeline};
/// use blue_language::model::Node;
///
/// let provider = |_: &str| Vec::new();
/// let pipeline = Pipeline::default();
/// let animal = Node::new().with_name("Animal").with_property("legs", Node::new().with_value(4));
/// let dog = Node::new().with_name("Rex").with_type(animal);
///
/// let resolved = Merger::new(&pipeline, &provider).resolve(&dog, &mut Limits::Unbounded).unwrap();
/// assert_eq!(resolved.name.as_deref(), Some("Rex"));
/// assert!(resolved.property("legs").is_some());
/// ```
pub struct Merger<'a> {
    processor: &'a dyn MergingProcessor,
    provider: &'a dyn NodeProvider,
    strategy: MissingContentStrategy,
    max_type_chain_depth: usize,
    max_nesting: usize,
    type_chain: Vec<String>,
    nesting: usize,
}

impl<'a> Merger<'a> {
    /// Create a merger running `processor` over content from `provider`.
    pub fn new(processor: &'a dyn MergingProcessor, provider: &'a dyn NodeProvider) -> Self {
        Self {
            processor,
            provider,
            strategy: MissingContentStrategy::default(),
            max_type_chain_depth: DEFAULT_MAX_TYPE_CHAIN_DEPTH,
            max_nesting: DEFAULT_MAX_NESTING,
            type_chain: Vec::new(),
            nesting: 0,
        }
    }

    /// How stub types the provider does not know are handled.
    pub fn with_strategy(mut self, strategy: MissingContentStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Longest type chain followed before it is reported as cyclic.
    pub fn with_max_type_chain_depth(mut self, depth: usize) -> Self {
        self.max_type_chain_depth = depth;
        self
    }

    /// Abandon resolution nested deeper than `depth` calls, which happens when a
    /// recursive type is resolved without limits.
    pub fn with_max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    fn context(&self) -> MergeContext<'a> {
        MergeContext::new(self.provider, self.max_type_chain_depth)
    }

    // ========== Entry points ==========

    /// Compute the effective content of `node` within `limits`.
    ///
    /// The result starts from an empty accumulator, takes everything the type chain
    /// supplies, then the node's own fields. Out-of-scope properties and items are kept as
    /// stubs of their blueIds. The result carries the node's own name, description and
    /// blueId.
    pub fn resolve(&mut self, node: &Node, limits: &mut Limits) -> Result<Node> {
        debug!(blue_id = ?node.blue_id, "resolve started");
        let resolved = self.resolve_owned(node.clone(), limits)?;
        debug!(properties = resolved.property_count(), "resolve finished");
        Ok(resolved)
    }

    /// Merge `source`, with its type chain, into an existing accumulator.
    pub fn merge(&mut self, target: &mut Node, source: &Node, limits: &mut Limits) -> Result<()> {
        self.merge_owned(target, source.clone(), limits)
    }

    // ========== Recursion ==========

    fn resolve_owned(&mut self, node: Node, limits: &mut Limits) -> Result<Node> {
        self.nesting += 1;
        let result = if self.nesting > self.max_nesting {
            Err(BlueError::Structure(format!(
                "resolution nested deeper than {} levels; bound it with limits",
                self.max_nesting
            )))
        } else {
            let name = node.name.clone();
            let description = node.description.clone();
            let blue_id = node.blue_id.clone();
            let mut target = Node::new();
            self.merge_owned(&mut target, node, limits).map(|()| {
                target.name = name;
                target.description = description;
                target.blue_id = blue_id;
                target
            })
        };
        self.nesting -= 1;
        result
    }

    /// Resolve a property or item. Type chains restart below it.
    fn resolve_child(&mut self, node: Node, limits: &mut Limits) -> Result<Node> {
        let saved = std::mem::take(&mut self.type_chain);
        let result = self.resolve_owned(node, limits);
        self.type_chain = saved;
        result
    }

    fn merge_owned(&mut self, target: &mut Node, mut source: Node, limits: &mut Limits) -> Result<()> {
        if let Some(type_node) = source.node_type.take() {
            let resolved_type = self.resolve_type(*type_node, limits)?;
            if *target == Node::default() {
                *target = inherited(&resolved_type);
            } else {
                self.merge_object(target, resolved_type.clone(), limits, false)?;
            }
            source.node_type = Some(Box::new(resolved_type));
        }
        self.merge_object(target, source, limits, true)
    }

    fn resolve_type(&mut self, mut type_node: Node, limits: &mut Limits) -> Result<Node> {
        let key = type_node.blue_id.clone();
        if let Some(id) = &key {
            if self.type_chain.contains(id) || self.type_chain.len() >= self.max_type_chain_depth {
                return Err(BlueError::CyclicTypeChain {
                    blue_id: id.clone(),
                    depth: self.type_chain.len(),
                });
            }
        }

        if type_node.is_stub() {
            trace!(blue_id = ?key, "dereferencing type");
            NodeExtender::new(self.provider)
                .with_strategy(self.strategy)
                .with_max_type_chain_depth(self.max_type_chain_depth)
                .extend(&mut type_node, &mut Limits::root_only())?;
        }

        let pushed = key.is_some();
        if let Some(id) = key {
            self.type_chain.push(id);
        }
        let result = self.resolve_owned(type_node, limits);
        if pushed {
            self.type_chain.pop();
        }
        result
    }

    fn merge_object(
        &mut self,
        target: &mut Node,
        mut source: Node,
        limits: &mut Limits,
        copy_identity: bool,
    ) -> Result<()> {
        let ctx = self.context();
        self.processor.process(target, &source, &ctx)?;

        if let Some(items) = source.items.take() {
            self.merge_items(target, items, limits)?;
        }

        if let Some(properties) = source.properties.take() {
            let before = target.property_count();
            for (key, value) in properties {
                if limits.should_descend(&key) {
                    let mut scope = limits.enter(&key);
                    let resolved = self.resolve_child(value, &mut scope)?;
                    match target.properties_mut().entry(key) {
                        Entry::Occupied(mut existing) => {
                            self.merge_object(existing.get_mut(), resolved, &mut scope, true)?
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(resolved);
                        }
                    }
                } else if let Entry::Vacant(slot) = target.properties_mut().entry(key) {
                    slot.insert(Node::stub(calculate_blue_id(&value)));
                }
            }
            if copy_identity && target.property_count() > before {
                if let Some(id) = &source.blue_id {
                    target.blue_id = Some(id.clone());
                }
            }
        }

        self.processor.post_process(target, &source, &ctx)
    }

    fn merge_items(&mut self, target: &mut Node, items: Vec<Node>, limits: &mut Limits) -> Result<()> {
        let mut merged = match target.items.take() {
            None => Vec::with_capacity(items.len()),
            Some(existing) if items.len() < existing.len() => {
                return Err(BlueError::ListShrink {
                    existing_len: existing.len(),
                    source_len: items.len(),
                });
            }
            Some(existing) => existing,
        };

        let inherited = merged.len();
        for (index, item) in items.into_iter().enumerate() {
            if index < inherited {
                let expected = calculate_blue_id(&merged[index]);
                let found = calculate_blue_id(&item);
                if expected != found {
                    return Err(BlueError::ItemMismatch {
                        index,
                        expected,
                        found,
                    });
                }
                continue;
            }

            let segment = index.to_string();
            if limits.should_descend(&segment) {
                let mut scope = limits.enter(&segment);
                merged.push(self.resolve_child(item, &mut scope)?);
            } else {
                merged.push(Node::stub(calculate_blue_id(&item)));
            }
        }

        target.items = Some(merged);
        Ok(())
    }
}

/// What a node takes from its resolved type: everything but the type's own identity.
fn inherited(resolved_type: &Node) -> Node {
    Node {
        name: None,
        description: None,
        blue_id: None,
        ..resolved_type.clone()
    }
}
