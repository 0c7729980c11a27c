//! Resolution: merging nodes with their type chains.
//!
//! [`Merger::resolve`] computes a node's effective content. Types are merged bottom up, so
//! every ancestor's defaults are present before the node's own fields are laid on top and
//! the most specific value wins only where it does not contradict an inherited one:
//!
//! ```text
//! resolve(node)
//! ├── resolve(node.type)            dereferencing a stub type first
//! │   └── resolve(node.type.type)   ... to the root of the chain
//! ├── accumulator := resolved type minus its name, description and blueId
//! └── merge node into accumulator
//!     ├── pipeline.process          type, value, list, dictionary, constraints
//!     ├── items                     resolved, or checked against the inherited prefix
//!     ├── properties                resolved, then merged into inherited ones
//!     └── pipeline.post_process     constraints verified
//! ```
//!
//! A [`Limits`](crate::limits::Limits) scope decides which properties and items are
//! descended into; everything outside it is kept as a stub of its blueId.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Merger`] | The recursive engine |
//! | [`MergingProcessor`] | One verification step |
//! | [`MergeStep`] | The built-in steps |
//! | [`Pipeline`] | An ordered list of steps, the default being all of them |
//!
//! # Errors
//!
//! Every inconsistency aborts the whole resolution: type mismatches, value conflicts,
//! shrinking lists, mismatched list prefixes and constraint violations. Nothing partial is
//! returned.

pub mod merger;
pub mod processor;

pub use merger::Merger;
pub use processor::{MergeContext, MergeStep, MergingProcessor, Pipeline};
