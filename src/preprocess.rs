//! Document preprocessing before hashing or resolution.
//!
//! Two rewrites, applied to every node of a tree:
//!
//! 1. Inline type names in `type`, `itemType`, `keyType` and `valueType` (`"type": "Text"`)
//!    become blueId stubs. The six basic types are always known; further names can be
//!    registered as aliases. An inline value that is itself a blueId becomes a stub of it.
//! 2. A scalar value without a type gets the matching basic type stub. This never changes
//!    the node's blueId, since hashing synthesizes the same type.

use std::collections::HashMap;

use crate::blue_id::canonical::inferred_type_id;
use crate::blue_id::is_potential_blue_id;
use crate::model::{Node, Scalar};
use crate::protocol::constants::BASIC_TYPES;

/// Rewrites inline type names and infers basic types.
///
/// # Examples
///
/// ```
/// use blue_language::preprocess::Preprocessor;
/// use blue_language::model::Node;
/// use blue_language::protocol::constants::INTEGER_TYPE_BLUE_ID;
///
/// let inline = Node::new().with_value("Integer").with_inline_value(true);
/// let node = Preprocessor::default().process(Node::new().with_type(inline).with_value(3));
/// assert_eq!(node.node_type.unwrap().blue_id.as_deref(), Some(INTEGER_TYPE_BLUE_ID));
/// ```
#[derive(Debug, Clone)]
pub struct Preprocessor {
    aliases: HashMap<String, String>,
    infer_basic_types: bool,
}

impl Default for Preprocessor {
    fn default() -> Self {
        let aliases = BASIC_TYPES
            .iter()
            .map(|(name, id)| (name.to_string(), id.to_string()))
            .collect();
        Self {
            aliases,
            infer_basic_types: true,
        }
    }
}

impl Preprocessor {
    /// Map an inline type name to a blueId.
    pub fn with_alias(mut self, name: impl Into<String>, blue_id: impl Into<String>) -> Self {
        self.aliases.insert(name.into(), blue_id.into());
        self
    }

    /// Turn basic type inference for untyped scalars on or off.
    pub fn with_type_inference(mut self, enabled: bool) -> Self {
        self.infer_basic_types = enabled;
        self
    }

    /// Preprocess a tree, returning the rewritten copy.
    pub fn process(&self, mut node: Node) -> Node {
        self.process_in_place(&mut node);
        node
    }

    /// Like [`Preprocessor::process`], mutating `node` directly.
    pub fn process_in_place(&self, node: &mut Node) {
        node.walk_mut(&mut |n| {
            for slot in [
                &mut n.node_type,
                &mut n.item_type,
                &mut n.key_type,
                &mut n.value_type,
            ] {
                if let Some(type_node) = slot.as_deref_mut() {
                    self.replace_inline_type(type_node);
                }
            }
            if self.infer_basic_types && !n.inline_value && n.node_type.is_none() {
                if let Some(value) = &n.value {
                    n.node_type = Some(Box::new(Node::stub(inferred_type_id(value))));
                }
            }
        });
    }

    fn replace_inline_type(&self, type_node: &mut Node) {
        if !type_node.inline_value {
            return;
        }
        let Some(Scalar::Text(name)) = &type_node.value else {
            return;
        };
        let blue_id = match self.aliases.get(name) {
            Some(id) => id.clone(),
            None if is_potential_blue_id(name) => name.clone(),
            None => return,
        };
        *type_node = Node::stub(blue_id);
    }
}
