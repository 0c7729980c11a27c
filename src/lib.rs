//! # Blue: content-addressed documents with inheritance
//!
//! This crate implements the core of the Blue document language: a tree of [`Node`]s where
//! every subtree has a content identifier (its *blueId*), a node may name another node as
//! its type, and resolution merges a node with its whole type chain while enforcing that
//! the result stays consistent.
//!
//! ## Overview
//!
//! Four mechanisms work together:
//!
//! 1. **Identity** - a blueId is the Base58 SHA-256 of a canonical JSON form. A subtree can
//!    be replaced by a stub `{"blueId": ...}` without changing any enclosing id.
//! 2. **Typing** - `type` points to another node. Subtyping is reachability along the
//!    `type` chain; the six basic types (Text, Integer, Double, Boolean, List, Dictionary)
//!    are the roots.
//! 3. **Resolution** - a node is merged onto its resolved type. Values may only be filled
//!    in, never changed; lists may only grow; constraints accumulate and are verified.
//! 4. **Scope** - [`Limits`] bound how far resolution and extension descend. Content
//!    outside the scope is kept as blueId stubs.
//!
//! ## Key Features
//!
//! - **Deterministic identity**: equal content gives equal ids regardless of key order
//! - **Stub transparency**: hashing an expanded subtree and its stub gives the same id
//! - **Lazy extension**: stubs are replaced by provider content only inside the scope
//! - **Pluggable pipeline**: resolution runs an ordered list of [`MergingProcessor`]s
//! - **Constraint propagation**: constraints from every level of a type chain combine
//! - **Cycle detection**: self-referential type chains are reported, not looped on
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use blue_language::{Blue, BlueError, Limits};
//! use blue_language::provider::InMemoryProvider;
//! use serde_json::json;
//!
//! let registry = Arc::new(InMemoryProvider::new());
//! let blue = Blue::new(registry.clone());
//!
//! let username = blue
//!     .node_from_json(&json!({
//!         "name": "Username",
//!         "type": "Text",
//!         "constraints": {"minLength": 3}
//!     }))
//!     .unwrap();
//! let username_id = registry.add(username).unwrap();
//!
//! let ok = blue.node_from_json(&json!({"type": {"blueId": username_id}, "value": "alice"})).unwrap();
//! assert!(blue.resolve(&ok, Limits::Unbounded).is_ok());
//!
//! let short = blue.node_from_json(&json!({"type": {"blueId": username_id}, "value": "al"})).unwrap();
//! let err = blue.resolve(&short, Limits::Unbounded).unwrap_err();
//! assert!(matches!(err, BlueError::ConstraintViolation { constraint: "minLength", .. }));
//! ```
//!
//! ## Module Structure
//!
//! - **[model]** - Node, scalar values and constraints
//! - **[protocol]** - well-known ids, reserved keys and JSON encoding
//! - **[blue_id]** - canonical form, hashing and Base58
//! - **[typing]** - subtype checks and basic type lookup
//! - **[limits]** - resolution scopes
//! - **[provider]** - content providers (basic types, in-memory, cached, sequential)
//! - **[preprocess]** - inline type names and basic type inference
//! - **[extend]** - lazy stub expansion
//! - **[merge]** - the resolution engine and its processor pipeline
//! - **[reverse]** - minimizing resolved nodes
//! - **[blue]** - the [`Blue`] facade and [`BlueConfig`]
//! - **[error]** - error types and result handling

#![warn(missing_docs)]

pub mod blue;
pub mod blue_id;
pub mod error;
pub mod extend;
pub mod limits;
pub mod merge;
pub mod model;
pub mod preprocess;
pub mod protocol;
pub mod provider;
pub mod reverse;
pub mod typing;

pub use blue::{Blue, BlueConfig};
pub use blue_id::{calculate_blue_id, calculate_blue_id_for_list};
pub use error::{BlueError, Result};
pub use extend::{MissingContentStrategy, NodeExtender};
pub use limits::Limits;
pub use merge::{Merger, MergingProcessor, Pipeline};
pub use model::{Constraints, Node, Scalar};
pub use provider::{InMemoryProvider, NodeProvider};
pub use reverse::MergeReverser;
