//! Minimizing resolved nodes.
//!
//! [`MergeReverser::reverse`] undoes what resolution adds: anything the type already
//! supplies is dropped, and resolved types collapse back to blueId stubs. Resolving the
//! minimal node again yields the original resolved node.

use crate::blue_id::{calculate_blue_id, calculate_blue_id_for_list};
use crate::model::Node;

/// Strips inherited content from resolved nodes.
///
/// # Examples
///
/// ```
/// use blue_language::model::Node;
/// use blue_language::reverse::MergeReverser;
///
/// let animal = Node::new().with_name("Animal").with_blue_id("animal-id")
///     .with_property("legs", Node::new().with_value(4));
/// let resolved = Node::new()
///     .with_name("Rex")
///     .with_type(animal)
///     .with_property("legs", Node::new().with_value(4));
///
/// let minimal = MergeReverser.reverse(&resolved);
/// assert_eq!(minimal.node_type.unwrap().blue_id.as_deref(), Some("animal-id"));
/// assert!(minimal.properties.is_none());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeReverser;

impl MergeReverser {
    /// Strip from `merged` everything its type chain already supplies.
    pub fn reverse(&self, merged: &Node) -> Node {
        let mut minimal = Node::new();
        reverse_node(&mut minimal, merged, None);
        minimal
    }
}

fn reverse_node(minimal: &mut Node, merged: &Node, from_type: Option<&Node>) {
    if merged.blue_id.is_some() && from_type.is_some_and(|t| t.blue_id == merged.blue_id) {
        return;
    }

    if merged.value.is_some() && from_type.map_or(true, |t| t.value.is_none()) {
        minimal.value = merged.value.clone();
    }

    minimal.node_type = collapse_type(merged.node_type.as_deref(), from_type.and_then(|t| t.node_type.as_deref()));
    minimal.item_type = collapse_type(merged.item_type.as_deref(), from_type.and_then(|t| t.item_type.as_deref()));
    minimal.key_type = collapse_type(merged.key_type.as_deref(), from_type.and_then(|t| t.key_type.as_deref()));
    minimal.value_type = collapse_type(merged.value_type.as_deref(), from_type.and_then(|t| t.value_type.as_deref()));

    if merged.name.is_some() && from_type.map_or(true, |t| t.name != merged.name) {
        minimal.name = merged.name.clone();
    }
    if merged.description.is_some() && from_type.map_or(true, |t| t.description != merged.description) {
        minimal.description = merged.description.clone();
    }
    if merged.blue_id.is_some() && from_type.map_or(true, |t| t.blue_id != merged.blue_id) {
        minimal.blue_id = merged.blue_id.clone();
    }
    if merged.constraints.is_some() && from_type.map_or(true, |t| t.constraints != merged.constraints) {
        minimal.constraints = merged.constraints.clone();
    }

    if let Some(items) = &merged.items {
        let inherited = from_type.and_then(|t| t.items.as_deref()).unwrap_or_default();
        let mut minimal_items = Vec::new();
        if !inherited.is_empty() {
            minimal_items.push(Node::stub(calculate_blue_id_for_list(inherited)));
        }
        if items.len() > inherited.len() {
            for item in &items[inherited.len()..] {
                let mut minimal_item = Node::new();
                reverse_node(&mut minimal_item, item, None);
                minimal_items.push(minimal_item);
            }
            minimal.items = Some(minimal_items);
        }
    }

    if let Some(properties) = &merged.properties {
        let type_properties = merged.node_type.as_ref().and_then(|t| t.properties.as_ref());
        for (key, value) in properties {
            let mut minimal_property = Node::new();
            reverse_node(
                &mut minimal_property,
                value,
                type_properties.and_then(|p| p.get(key)),
            );
            if minimal_property != Node::default() {
                minimal.properties_mut().insert(key.clone(), minimal_property);
            }
        }
    }
}

/// A stub of `merged` unless the type already names the same id.
fn collapse_type(merged: Option<&Node>, inherited: Option<&Node>) -> Option<Box<Node>> {
    let merged = merged?;
    let id = type_id(merged);
    if inherited.is_some_and(|t| type_id(t) == id) {
        return None;
    }
    Some(Box::new(Node::stub(id)))
}

fn type_id(node: &Node) -> String {
    node.blue_id.clone().unwrap_or_else(|| calculate_blue_id(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::Limits;
    use crate::merge::{Merger, Pipeline};
    use crate::protocol::constants::INTEGER_TYPE_BLUE_ID;
    use crate::provider::InMemoryProvider;

    #[test]
    fn test_reverse_drops_inherited_content() {
        let provider = InMemoryProvider::new();
        let person = provider
            .add(
                Node::new()
                    .with_name("Person")
                    .with_property("species", Node::new().with_value("human"))
                    .with_property("age", Node::new().with_type(Node::stub(INTEGER_TYPE_BLUE_ID))),
            )
            .unwrap();
        let alice = Node::new()
            .with_name("Alice")
            .with_type(Node::stub(&person))
            .with_property("age", Node::new().with_value(30));

        let pipeline = Pipeline::default();
        let resolved = Merger::new(&pipeline, &provider)
            .resolve(&alice, &mut Limits::Unbounded)
            .unwrap();
        let minimal = MergeReverser.reverse(&resolved);

        assert_eq!(minimal.name.as_deref(), Some("Alice"));
        assert_eq!(minimal.node_type.as_ref().unwrap().blue_id.as_deref(), Some(person.as_str()));
        assert!(minimal.node_type.as_ref().unwrap().is_stub());
        assert!(minimal.property("species").is_none());
        assert_eq!(minimal.get("/age").unwrap().value, Some(30.into()));
        assert!(minimal.get("/age").unwrap().node_type.is_none());

        let again = Merger::new(&pipeline, &provider)
            .resolve(&minimal, &mut Limits::Unbounded)
            .unwrap();
        assert_eq!(again, resolved);
    }

    #[test]
    fn test_untyped_node_kept_whole() {
        let node = Node::new()
            .with_name("plain")
            .with_property("x", Node::new().with_value(1))
            .with_items(vec![Node::new().with_value("a")]);
        assert_eq!(MergeReverser.reverse(&node), node);
    }
}
