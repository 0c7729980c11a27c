//! Verification steps run at every object boundary during a merge.
//!
//! Each step sees the accumulator (`target`) and the node being merged into it (`source`).
//! [`MergingProcessor::process`] runs before the source's items and properties are merged,
//! [`MergingProcessor::post_process`] after.
//!
//! # Default order
//!
//! | Step | Phase | Checks |
//! |------|-------|--------|
//! | [`ExclusiveItemsOrValue`] | process | `value` and `items` never coexist |
//! | [`TypeAssigner`] | process | source type is a subtype of the accumulator's |
//! | [`ValuePropagator`] | process | values agree, or the accumulator takes the source's |
//! | [`BasicTypesVerifier`] | process | the value fits the basic type of the chain |
//! | [`ListProcessor`] | process | `itemType` propagation and item conformance |
//! | [`DictionaryProcessor`] | process | `keyType`/`valueType` propagation and entry conformance |
//! | [`ConstraintsPropagator`] | process | constraints tighten |
//! | [`ConstraintsVerifier`] | post | the merged node satisfies its constraints |

mod basic_types;
mod constraints;
mod dictionary;
mod exclusive;
mod list;
mod type_assigner;
mod value;

pub use basic_types::BasicTypesVerifier;
pub use constraints::{ConstraintsPropagator, ConstraintsVerifier};
pub use dictionary::DictionaryProcessor;
pub use exclusive::ExclusiveItemsOrValue;
pub use list::ListProcessor;
pub use type_assigner::TypeAssigner;
pub use value::ValuePropagator;

use crate::error::Result;
use crate::model::Node;
use crate::provider::NodeProvider;
use crate::typing;

/// What a step may consult besides the two nodes.
#[derive(Clone, Copy)]
pub struct MergeContext<'a> {
    /// Source of type content
    pub provider: &'a dyn NodeProvider,
    /// Longest type chain walked
    pub max_type_chain_depth: usize,
}

impl<'a> MergeContext<'a> {
    /// Bundle a provider with a chain depth bound.
    pub fn new(provider: &'a dyn NodeProvider, max_type_chain_depth: usize) -> Self {
        Self {
            provider,
            max_type_chain_depth,
        }
    }

    /// Subtype check against the provider.
    pub fn is_subtype(&self, subtype: &Node, supertype: &Node) -> Result<bool> {
        typing::is_subtype_within(subtype, supertype, self.provider, self.max_type_chain_depth)
    }

    /// The basic type at the root of `type_node`'s chain.
    pub fn basic_type_of(&self, type_node: &Node) -> Result<Option<&'static str>> {
        typing::basic_type_of(type_node, self.provider, self.max_type_chain_depth)
    }

    /// Whether `type_node` derives from `List`.
    pub fn is_list_type(&self, type_node: &Node) -> Result<bool> {
        typing::is_list_type(type_node, self.provider, self.max_type_chain_depth)
    }

    /// Whether `type_node` derives from `Dictionary`.
    pub fn is_dictionary_type(&self, type_node: &Node) -> Result<bool> {
        typing::is_dictionary_type(type_node, self.provider, self.max_type_chain_depth)
    }
}

/// One verification step.
pub trait MergingProcessor: Send + Sync {
    /// Runs before the source's children are merged.
    fn process(&self, target: &mut Node, source: &Node, ctx: &MergeContext<'_>) -> Result<()>;

    /// Runs once the source has been fully merged into the target.
    fn post_process(&self, _target: &mut Node, _source: &Node, _ctx: &MergeContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// The built-in steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStep {
    /// See [`ExclusiveItemsOrValue`]
    ExclusiveItemsOrValue,
    /// See [`TypeAssigner`]
    TypeAssigner,
    /// See [`ValuePropagator`]
    ValuePropagator,
    /// See [`BasicTypesVerifier`]
    BasicTypesVerifier,
    /// See [`ListProcessor`]
    ListProcessor,
    /// See [`DictionaryProcessor`]
    DictionaryProcessor,
    /// See [`ConstraintsPropagator`]
    ConstraintsPropagator,
    /// See [`ConstraintsVerifier`]
    ConstraintsVerifier,
}

impl MergeStep {
    fn processor(self) -> &'static dyn MergingProcessor {
        match self {
            MergeStep::ExclusiveItemsOrValue => &ExclusiveItemsOrValue,
            MergeStep::TypeAssigner => &TypeAssigner,
            MergeStep::ValuePropagator => &ValuePropagator,
            MergeStep::BasicTypesVerifier => &BasicTypesVerifier,
            MergeStep::ListProcessor => &ListProcessor,
            MergeStep::DictionaryProcessor => &DictionaryProcessor,
            MergeStep::ConstraintsPropagator => &ConstraintsPropagator,
            MergeStep::ConstraintsVerifier => &ConstraintsVerifier,
        }
    }
}

impl MergingProcessor for MergeStep {
    fn process(&self, target: &mut Node, source: &Node, ctx: &MergeContext<'_>) -> Result<()> {
        self.processor().process(target, source, ctx)
    }

    fn post_process(&self, target: &mut Node, source: &Node, ctx: &MergeContext<'_>) -> Result<()> {
        self.processor().post_process(target, source, ctx)
    }
}

/// An ordered list of steps, run in sequence.
///
/// # Examples
///
/// ```
/// use blue_language::merge::{MergeStep, Pipeline};
///
/// let pipeline = Pipeline::default().without(MergeStep::ConstraintsVerifier);
/// assert!(!pipeline.steps().contains(&MergeStep::ConstraintsVerifier));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    steps: Vec<MergeStep>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(vec![
            MergeStep::ExclusiveItemsOrValue,
            MergeStep::TypeAssigner,
            MergeStep::ValuePropagator,
            MergeStep::BasicTypesVerifier,
            MergeStep::ListProcessor,
            MergeStep::DictionaryProcessor,
            MergeStep::ConstraintsPropagator,
            MergeStep::ConstraintsVerifier,
        ])
    }
}

impl Pipeline {
    /// A pipeline running `steps` in order.
    pub fn new(steps: Vec<MergeStep>) -> Self {
        Self { steps }
    }

    /// The steps in run order.
    pub fn steps(&self) -> &[MergeStep] {
        &self.steps
    }

    /// Drop every occurrence of `step`.
    pub fn without(mut self, step: MergeStep) -> Self {
        self.steps.retain(|s| *s != step);
        self
    }
}

impl MergingProcessor for Pipeline {
    fn process(&self, target: &mut Node, source: &Node, ctx: &MergeContext<'_>) -> Result<()> {
        for step in &self.steps {
            step.process(target, source, ctx)?;
        }
        Ok(())
    }

    fn post_process(&self, target: &mut Node, source: &Node, ctx: &MergeContext<'_>) -> Result<()> {
        for step in &self.steps {
            step.post_process(target, source, ctx)?;
        }
        Ok(())
    }
}
