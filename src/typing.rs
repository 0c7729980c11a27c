//! Type chains and subtyping.
//!
//! A node's type chain is `node.type`, `node.type.type`, and so on. Stubs along the chain
//! are dereferenced through a [`NodeProvider`]; an id naming several documents is an
//! error, and an unknown id ends the chain.
//!
//! Chains are checked for cycles: revisiting an id, or walking more than the configured
//! number of links, fails with [`BlueError::CyclicTypeChain`] instead of looping.

use std::borrow::Cow;
use std::collections::HashSet;

use tracing::trace;

use crate::blue_id::calculate_blue_id;
use crate::error::{BlueError, Result};
use crate::model::{Node, Scalar};
use crate::protocol::constants::*;
use crate::provider::{fetch_single, NodeProvider};

/// Default bound on the length of a type chain.
pub const DEFAULT_MAX_TYPE_CHAIN_DEPTH: usize = 64;

/// Walk the chain starting at `start` itself, calling `visit` with each link's id until it
/// returns true. Returns whether `visit` ever did.
fn walk_chain(
    start: &Node,
    provider: &dyn NodeProvider,
    max_depth: usize,
    mut visit: impl FnMut(&str) -> bool,
) -> Result<bool> {
    let mut current: Cow<'_, Node> = Cow::Borrowed(start);
    let mut visited: HashSet<String> = HashSet::new();

    loop {
        let id = calculate_blue_id(&current);
        if visit(&id) {
            return Ok(true);
        }
        let depth = visited.len();
        if depth >= max_depth || !visited.insert(id.clone()) {
            return Err(BlueError::CyclicTypeChain { blue_id: id, depth });
        }

        let next = if current.is_stub() {
            match fetch_single(provider, &id)? {
                Some(definition) => definition.node_type,
                None => {
                    trace!(blue_id = %id, "type chain ends at unknown id");
                    None
                }
            }
        } else {
            current.node_type.clone()
        };

        match next {
            Some(next) => current = Cow::Owned(*next),
            None => return Ok(false),
        }
    }
}

/// Whether `subtype` equals `supertype` or has it somewhere in its type chain.
///
/// # Examples
///
/// ```
/// use blue_language::model::Node;
/// use blue_language::typing::is_subtype;
///
/// let provider = |_: &str| Vec::new();
/// let animal = Node::new().with_name("Animal");
/// let dog = Node::new().with_name("Dog").with_type(animal.clone());
/// assert!(is_subtype(&dog, &animal, &provider).unwrap());
/// assert!(!is_subtype(&animal, &dog, &provider).unwrap());
/// ```
pub fn is_subtype(subtype: &Node, supertype: &Node, provider: &dyn NodeProvider) -> Result<bool> {
    is_subtype_within(subtype, supertype, provider, DEFAULT_MAX_TYPE_CHAIN_DEPTH)
}

/// [`is_subtype`] with an explicit chain-length bound.
pub fn is_subtype_within(
    subtype: &Node,
    supertype: &Node,
    provider: &dyn NodeProvider,
    max_depth: usize,
) -> Result<bool> {
    let target = calculate_blue_id(supertype);
    walk_chain(subtype, provider, max_depth, |id| id == target)
}

/// Name of the basic type reached by a type node's chain, if any.
pub fn basic_type_of(
    type_node: &Node,
    provider: &dyn NodeProvider,
    max_depth: usize,
) -> Result<Option<&'static str>> {
    let mut found = None;
    walk_chain(type_node, provider, max_depth, |id| {
        found = basic_type_name(id);
        found.is_some()
    })?;
    Ok(found)
}

/// Whether the type node is, or derives from, the built-in List type.
pub fn is_list_type(type_node: &Node, provider: &dyn NodeProvider, max_depth: usize) -> Result<bool> {
    walk_chain(type_node, provider, max_depth, |id| id == LIST_TYPE_BLUE_ID)
}

/// Whether the type node is, or derives from, the built-in Dictionary type.
pub fn is_dictionary_type(
    type_node: &Node,
    provider: &dyn NodeProvider,
    max_depth: usize,
) -> Result<bool> {
    walk_chain(type_node, provider, max_depth, |id| id == DICTIONARY_TYPE_BLUE_ID)
}

/// True for the ids of the six built-in types.
pub fn is_basic_type_id(blue_id: &str) -> bool {
    basic_type_name(blue_id).is_some()
}

/// Whether a scalar may be held by a node of the given basic type.
///
/// Integers are accepted where a Double is expected. List and Dictionary hold no scalars.
pub fn value_conforms(basic_type: &str, value: &Scalar) -> bool {
    match (basic_type, value) {
        (TEXT_TYPE, Scalar::Text(_)) => true,
        (INTEGER_TYPE, Scalar::Integer(_)) => true,
        (DOUBLE_TYPE, Scalar::Decimal(_) | Scalar::Integer(_)) => true,
        (BOOLEAN_TYPE, Scalar::Boolean(_)) => true,
        _ => false,
    }
}
