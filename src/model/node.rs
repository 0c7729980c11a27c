//! The tree value at the heart of the document model.

use std::collections::BTreeMap;

use super::{Constraints, Scalar};

/// A document node.
///
/// Every field is optional. The only structural invariant is that `value` and `items` are
/// never both set; it is checked when nodes are merged, not when they are built.
///
/// A node with a `blue_id` and no structural content is a *stub*: a reference to content
/// stored elsewhere that must be fetched through a
/// [`NodeProvider`](crate::provider::NodeProvider) before it can be inspected.
///
/// Cloning is a deep copy. No subtree is shared between two clones.
///
/// # Examples
///
/// ```
/// use blue_language::model::Node;
///
/// let person = Node::new()
///     .with_name("Alice")
///     .with_property("age", Node::new().with_value(30));
///
/// assert_eq!(person.property("age").and_then(|n| n.value.as_ref()).map(|v| v.to_string()),
///            Some("30".to_string()));
/// assert!(Node::stub("abc").is_stub());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    /// Display name
    pub name: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Node this one inherits from
    pub node_type: Option<Box<Node>>,
    /// Type every list item must conform to
    pub item_type: Option<Box<Node>>,
    /// Type of dictionary keys
    pub key_type: Option<Box<Node>>,
    /// Type of dictionary values
    pub value_type: Option<Box<Node>>,
    /// Scalar payload; never set together with `items`
    pub value: Option<Scalar>,
    /// List payload
    pub items: Option<Vec<Node>>,
    /// Named children, kept in key order
    pub properties: Option<BTreeMap<String, Node>>,
    /// Content id, or the only field of a stub
    pub blue_id: Option<String>,
    /// Validation rules
    pub constraints: Option<Constraints>,
    /// Set when the node was written as a bare scalar in a type position (`type: Text`)
    pub inline_value: bool,
}

impl Node {
    /// Create an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stub referencing `blue_id`.
    pub fn stub(blue_id: impl Into<String>) -> Self {
        Self {
            blue_id: Some(blue_id.into()),
            ..Self::default()
        }
    }

    // ========== Builders ==========

    /// Set `name`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set `description`.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set `type`.
    pub fn with_type(mut self, node_type: Node) -> Self {
        self.node_type = Some(Box::new(node_type));
        self
    }

    /// Set `item_type`.
    pub fn with_item_type(mut self, item_type: Node) -> Self {
        self.item_type = Some(Box::new(item_type));
        self
    }

    /// Set `key_type`.
    pub fn with_key_type(mut self, key_type: Node) -> Self {
        self.key_type = Some(Box::new(key_type));
        self
    }

    /// Set `value_type`.
    pub fn with_value_type(mut self, value_type: Node) -> Self {
        self.value_type = Some(Box::new(value_type));
        self
    }

    /// Set `value`.
    pub fn with_value(mut self, value: impl Into<Scalar>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the list payload.
    pub fn with_items(mut self, items: Vec<Node>) -> Self {
        self.items = Some(items);
        self
    }

    /// Add or replace a single property.
    pub fn with_property(mut self, key: impl Into<String>, value: Node) -> Self {
        self.properties_mut().insert(key.into(), value);
        self
    }

    /// Set `blue_id`.
    pub fn with_blue_id(mut self, blue_id: impl Into<String>) -> Self {
        self.blue_id = Some(blue_id.into());
        self
    }

    /// Set `constraints`.
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Set `inline_value`.
    pub fn with_inline_value(mut self, inline: bool) -> Self {
        self.inline_value = inline;
        self
    }

    // ========== Inspection ==========

    /// True when the node carries only an id (plus optional name/description).
    pub fn is_stub(&self) -> bool {
        self.blue_id.is_some() && !self.has_structure()
    }

    /// True when any structural field is set.
    pub fn has_structure(&self) -> bool {
        self.node_type.is_some()
            || self.item_type.is_some()
            || self.key_type.is_some()
            || self.value_type.is_some()
            || self.value.is_some()
            || self.items.is_some()
            || self.properties.is_some()
            || self.constraints.is_some()
    }

    /// Look up a property by name.
    pub fn property(&self, key: &str) -> Option<&Node> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }

    /// Look up a property by name, mutably.
    pub fn property_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.properties.as_mut().and_then(|p| p.get_mut(key))
    }

    /// The property map, created empty if absent.
    pub fn properties_mut(&mut self) -> &mut BTreeMap<String, Node> {
        self.properties.get_or_insert_with(BTreeMap::new)
    }

    /// The item list, created empty if absent.
    pub fn items_mut(&mut self) -> &mut Vec<Node> {
        self.items.get_or_insert_with(Vec::new)
    }

    /// Number of properties, zero when absent.
    pub fn property_count(&self) -> usize {
        self.properties.as_ref().map_or(0, |p| p.len())
    }

    /// Visit this node and every descendant, pre-order, without mutating.
    pub fn walk(&self, visit: &mut impl FnMut(&Node)) {
        visit(self);
        for t in [&self.node_type, &self.item_type, &self.key_type, &self.value_type]
            .into_iter()
            .flatten()
        {
            t.walk(visit);
        }
        for item in self.items.iter().flatten() {
            item.walk(visit);
        }
        for value in self.properties.iter().flat_map(|p| p.values()) {
            value.walk(visit);
        }
        for option in self.constraints.iter().flat_map(|c| c.options.iter().flatten()) {
            option.walk(visit);
        }
    }

    /// Visit this node and every descendant, pre-order.
    ///
    /// Descendants include type nodes, items, properties and constraint options.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Node)) {
        visit(self);
        for t in [
            &mut self.node_type,
            &mut self.item_type,
            &mut self.key_type,
            &mut self.value_type,
        ]
        .into_iter()
        .flatten()
        {
            t.walk_mut(visit);
        }
        for item in self.items.iter_mut().flatten() {
            item.walk_mut(visit);
        }
        for value in self.properties.iter_mut().flat_map(|p| p.values_mut()) {
            value.walk_mut(visit);
        }
        if let Some(options) = self.constraints.as_mut().and_then(|c| c.options.as_mut()) {
            for option in options {
                option.walk_mut(visit);
            }
        }
    }

    /// Walk a `/`-separated path of property names and item indexes.
    ///
    /// `"/"` or `""` returns the node itself. Returns `None` if any segment is missing.
    pub fn get(&self, path: &str) -> Option<&Node> {
        let mut current = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match segment.parse::<usize>() {
                Ok(index) if current.items.is_some() => current.items.as_ref()?.get(index)?,
                _ => current.property(segment)?,
            };
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_detection() {
        assert!(Node::stub("x").is_stub());
        assert!(Node::stub("x").with_name("named").is_stub());
        assert!(!Node::stub("x").with_value(1).is_stub());
        assert!(!Node::new().is_stub());
    }

    #[test]
    fn test_clone_is_deep() {
        let original = Node::new().with_property("a", Node::new().with_value(1));
        let mut copy = original.clone();
        copy.property_mut("a").unwrap().value = Some(Scalar::from(2));
        assert_eq!(original.property("a").unwrap().value, Some(Scalar::from(1)));
    }

    #[test]
    fn test_get_path() {
        let node = Node::new().with_property(
            "list",
            Node::new().with_items(vec![Node::new().with_value("x"), Node::new().with_value("y")]),
        );
        assert_eq!(node.get("/list/1").unwrap().value, Some(Scalar::from("y")));
        assert!(node.get("/list/5").is_none());
        assert_eq!(node.get("/"), Some(&node));
    }
}
