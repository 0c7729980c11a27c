//! In-memory content registry.
//!
//! Documents are preprocessed (inline basic type names become blueId stubs), hashed, and
//! stored under their blueId. A list registered as a whole is stored under the id of the
//! list; its members are then addressable as `id#0`, `id#1`, and so on.
//!
//! # Self-references
//!
//! A registered document may refer to itself before its id is known. Any `blueId` or text
//! value equal to `this` (single document) or `this#<i>` (member of a list) is rewritten to
//! the real id when the document is fetched. The id itself is computed over the unresolved
//! `this` text.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use regex::Regex;
use tracing::debug;

use super::NodeProvider;
use crate::blue_id::{calculate_blue_id, calculate_blue_id_for_list};
use crate::error::{BlueError, Result};
use crate::model::{Node, Scalar};
use crate::preprocess::Preprocessor;
use crate::protocol::constants::THIS_REFERENCE;

static THIS_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^this(#\d+)?$").expect("self-reference pattern is valid"));

#[derive(Debug, Clone)]
enum Stored {
    Single(Node),
    List(Vec<Node>),
}

/// Thread-safe in-memory provider.
///
/// # Examples
///
/// ```
/// use blue_language::provider::{InMemoryProvider, NodeProvider};
/// use blue_language::model::Node;
///
/// let provider = InMemoryProvider::new();
/// let id = provider.add(Node::new().with_name("Person")).unwrap();
/// assert_eq!(provider.fetch_first(&id).unwrap().name.as_deref(), Some("Person"));
/// assert_eq!(provider.blue_id_by_name("Person"), Some(id));
/// ```
pub struct InMemoryProvider {
    documents: RwLock<HashMap<String, Stored>>,
    names: RwLock<HashMap<String, Vec<String>>>,
    preprocessor: Preprocessor,
}

impl InMemoryProvider {
    /// Create an empty provider with the default preprocessor.
    pub fn new() -> Self {
        Self::with_preprocessor(Preprocessor::default())
    }

    /// An empty provider that preprocesses everything it stores.
    pub fn with_preprocessor(preprocessor: Preprocessor) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            names: RwLock::new(HashMap::new()),
            preprocessor,
        }
    }

    // ========== Registration ==========

    /// Register a document. A node holding only items is registered as a sibling list.
    pub fn add(&self, node: Node) -> Result<String> {
        if Self::has_items_only(&node) {
            let items = node.items.unwrap_or_default();
            return self.add_list(items);
        }
        self.add_single(node)
    }

    /// Register one document and return its blueId.
    pub fn add_single(&self, node: Node) -> Result<String> {
        let node = self.preprocessor.process(node);
        check_this_references(std::slice::from_ref(&node), false)?;

        let blue_id = calculate_blue_id(&node);
        if let Some(name) = &node.name {
            self.register_name(name, &blue_id);
        }
        debug!(blue_id = %blue_id, "registered document");
        self.documents.write().insert(blue_id.clone(), Stored::Single(node));
        Ok(blue_id)
    }

    /// Register a list of sibling documents and return the id of the list.
    pub fn add_list(&self, items: Vec<Node>) -> Result<String> {
        if items.is_empty() {
            return Err(BlueError::InvalidDocument(
                "cannot register an empty list".to_string(),
            ));
        }
        let items: Vec<Node> = items
            .into_iter()
            .map(|item| self.preprocessor.process(item))
            .collect();
        let multiple = items.len() > 1;
        check_this_references(&items, multiple)?;

        let blue_id = calculate_blue_id_for_list(&items);
        for (i, item) in items.iter().enumerate() {
            if let Some(name) = &item.name {
                self.register_name(name, &format!("{}#{}", blue_id, i));
            }
        }
        debug!(blue_id = %blue_id, count = items.len(), "registered document list");
        let stored = if multiple {
            Stored::List(items)
        } else {
            Stored::Single(items.into_iter().next().unwrap_or_default())
        };
        self.documents.write().insert(blue_id.clone(), stored);
        Ok(blue_id)
    }

    /// Register a list and, separately, each of its members.
    pub fn add_list_and_items(&self, items: Vec<Node>) -> Result<(String, Vec<String>)> {
        let list_id = self.add_list(items.clone())?;
        let item_ids = items
            .into_iter()
            .map(|item| self.add_single(item))
            .collect::<Result<Vec<_>>>()?;
        Ok((list_id, item_ids))
    }

    fn register_name(&self, name: &str, blue_id: &str) {
        self.names
            .write()
            .entry(name.to_string())
            .or_default()
            .push(blue_id.to_string());
    }

    fn has_items_only(node: &Node) -> bool {
        node.items.is_some()
            && node.name.is_none()
            && node.description.is_none()
            && node.node_type.is_none()
            && node.value.is_none()
            && node.properties.is_none()
            && node.blue_id.is_none()
            && node.constraints.is_none()
    }

    // ========== Lookup ==========

    /// The first id registered under `name`.
    pub fn blue_id_by_name(&self, name: &str) -> Option<String> {
        self.names.read().get(name).and_then(|ids| ids.first().cloned())
    }

    /// The first document registered under `name`.
    pub fn node_by_name(&self, name: &str) -> Option<Node> {
        let blue_id = self.blue_id_by_name(name)?;
        self.fetch_first(&blue_id)
    }

    /// Number of stored documents and lists.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeProvider for InMemoryProvider {
    fn fetch_by_blue_id(&self, blue_id: &str) -> Vec<Node> {
        let (base, index) = match blue_id.split_once('#') {
            Some((base, index)) => match index.parse::<usize>() {
                Ok(index) => (base, Some(index)),
                Err(_) => return Vec::new(),
            },
            None => (blue_id, None),
        };

        let Some(stored) = self.documents.read().get(base).cloned() else {
            return Vec::new();
        };

        match (stored, index) {
            (Stored::List(items), Some(i)) => items
                .into_iter()
                .nth(i)
                .map(|item| vec![resolve_this(item, base).with_blue_id(blue_id)])
                .unwrap_or_default(),
            (Stored::Single(node), Some(0)) => vec![resolve_this(node, base).with_blue_id(blue_id)],
            (Stored::Single(_), Some(_)) => Vec::new(),
            (Stored::List(items), None) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| resolve_this(item, base).with_blue_id(format!("{}#{}", base, i)))
                .collect(),
            (Stored::Single(node), None) => vec![resolve_this(node, base).with_blue_id(base)],
        }
    }
}

// ----------------------------------------------------------------------------
// Self-references
// ----------------------------------------------------------------------------

fn this_references(node: &Node) -> Vec<String> {
    let mut found = Vec::new();
    node.walk(&mut |n| {
        if let Some(id) = n.blue_id.as_deref().filter(|id| THIS_REFERENCE_RE.is_match(id)) {
            found.push(id.to_string());
        }
        if let Some(text) = n
            .value
            .as_ref()
            .and_then(Scalar::as_text)
            .filter(|t| THIS_REFERENCE_RE.is_match(t))
        {
            found.push(text.to_string());
        }
    });
    found
}

/// Single documents may only say `this`; list members must say `this#<i>`.
fn check_this_references(nodes: &[Node], multiple: bool) -> Result<()> {
    for reference in nodes.iter().flat_map(this_references) {
        let indexed = reference != THIS_REFERENCE;
        if multiple && !indexed {
            return Err(BlueError::InvalidDocument(
                "members of a document list must reference each other as this#<index>".to_string(),
            ));
        }
        if !multiple && indexed {
            return Err(BlueError::InvalidDocument(format!(
                "a single document may only reference itself as this, found {}",
                reference
            )));
        }
    }
    Ok(())
}

fn resolve_this(mut node: Node, base: &str) -> Node {
    let rewrite = |text: &str| format!("{}{}", base, &text[THIS_REFERENCE.len()..]);
    node.walk_mut(&mut |n| {
        if let Some(id) = n.blue_id.as_deref().filter(|id| THIS_REFERENCE_RE.is_match(id)) {
            n.blue_id = Some(rewrite(id));
        }
        if let Some(Scalar::Text(text)) = &n.value {
            if THIS_REFERENCE_RE.is_match(text) {
                n.value = Some(Scalar::Text(rewrite(text)));
            }
        }
    });
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::TEXT_TYPE_BLUE_ID;

    #[test]
    fn test_add_and_fetch_single() {
        let provider = InMemoryProvider::new();
        let node = Node::new().with_name("A").with_property("x", Node::new().with_value(1));
        let id = provider.add(node).unwrap();
        let fetched = provider.fetch_by_blue_id(&id);
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].blue_id.as_deref(), Some(id.as_str()));
        assert!(provider.fetch_by_blue_id(&format!("{}#0", id)).len() == 1);
        assert!(provider.fetch_by_blue_id(&format!("{}#1", id)).is_empty());
    }

    #[test]
    fn test_list_members_are_indexed() {
        let provider = InMemoryProvider::new();
        let id = provider
            .add(Node::new().with_items(vec![Node::new().with_name("first"), Node::new().with_name("second")]))
            .unwrap();

        let all = provider.fetch_by_blue_id(&id);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].blue_id, Some(format!("{}#1", id)));

        let second = provider.fetch_by_blue_id(&format!("{}#1", id));
        assert_eq!(second[0].name.as_deref(), Some("second"));
        assert_eq!(provider.blue_id_by_name("first"), Some(format!("{}#0", id)));
    }

    #[test]
    fn test_this_reference_resolved_on_fetch() {
        let provider = InMemoryProvider::new();
        let node = Node::new()
            .with_name("Tree")
            .with_property("parent", Node::new().with_type(Node::stub("this")));
        let id = provider.add(node).unwrap();
        let fetched = provider.fetch_first(&id).unwrap();
        let parent_type = fetched.property("parent").unwrap().node_type.as_ref().unwrap();
        assert_eq!(parent_type.blue_id.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn test_indexed_this_rejected_in_single_document() {
        let provider = InMemoryProvider::new();
        let node = Node::new().with_property("p", Node::stub("this#1"));
        assert!(matches!(provider.add(node), Err(BlueError::InvalidDocument(_))));
    }

    #[test]
    fn test_list_members_reference_each_other() {
        let provider = InMemoryProvider::new();
        let id = provider
            .add_list(vec![
                Node::new().with_name("a").with_property("next", Node::stub("this#1")),
                Node::new().with_name("b").with_property("prev", Node::stub("this#0")),
            ])
            .unwrap();
        let a = provider.fetch_first(&format!("{}#0", id)).unwrap();
        assert_eq!(a.property("next").unwrap().blue_id, Some(format!("{}#1", id)));
    }

    #[test]
    fn test_inline_type_names_preprocessed() {
        let provider = InMemoryProvider::new();
        let node = Node::new()
            .with_name("Named")
            .with_property("label", Node::new().with_type(Node::new().with_value("Text").with_inline_value(true)));
        let id = provider.add(node).unwrap();
        let fetched = provider.fetch_first(&id).unwrap();
        let label_type = fetched.property("label").unwrap().node_type.as_ref().unwrap();
        assert_eq!(label_type.blue_id.as_deref(), Some(TEXT_TYPE_BLUE_ID));
    }

    #[test]
    fn test_node_by_name() {
        let provider = InMemoryProvider::new();
        provider.add(Node::new().with_name("X").with_value(5)).unwrap();
        assert!(provider.node_by_name("X").is_some());
        assert!(provider.node_by_name("Y").is_none());
    }
}
