//! Lazy extension: replacing stubs with fetched content.
//!
//! [`NodeExtender::extend`] walks a tree inside a [`Limits`] scope and splices provider
//! content into every stub it reaches:
//!
//! | Candidates for the stub's id | Result |
//! |------------------------------|--------|
//! | one | the candidate's fields are copied into the stub, which keeps its id |
//! | several | the stub becomes a list node holding every candidate |
//! | none | [`BlueError::MissingContent`], or the stub is left as is under [`MissingContentStrategy::Skip`] |
//!
//! Type fields (`type`, `itemType`, `keyType`, `valueType`) are extended at the current
//! position without consuming a scope segment. Properties and items each consume one.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{BlueError, Result};
use crate::limits::Limits;
use crate::merge::merger::DEFAULT_MAX_NESTING;
use crate::model::Node;
use crate::provider::NodeProvider;
use crate::typing::{is_basic_type_id, DEFAULT_MAX_TYPE_CHAIN_DEPTH};

/// What to do with a stub whose id the provider does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingContentStrategy {
    /// Abort with [`BlueError::MissingContent`]
    #[default]
    Fail,
    /// Leave the stub in place and carry on
    Skip,
}

/// Splices provider content into stubs.
///
/// # Examples
///
/// ```
/// use blue_language::extend::NodeExtender;
/// use blue_language::limits::Limits;
/// use blue_language::model::Node;
/// use blue_language::provider::InMemoryProvider;
///
/// let provider = InMemoryProvider::new();
/// let id = provider.add(Node::new().with_name("Address").with_property("city", Node::new().with_value("Oslo"))).unwrap();
///
/// let mut node = Node::new().with_property("home", Node::stub(&id));
/// NodeExtender::new(&provider).extend(&mut node, &mut Limits::Unbounded).unwrap();
/// assert!(node.get("/home/city").is_some());
/// ```
pub struct NodeExtender<'a> {
    provider: &'a dyn NodeProvider,
    strategy: MissingContentStrategy,
    max_type_chain_depth: usize,
    max_nesting: usize,
}

impl<'a> NodeExtender<'a> {
    /// Create an extender fetching from `provider`.
    pub fn new(provider: &'a dyn NodeProvider) -> Self {
        Self {
            provider,
            strategy: MissingContentStrategy::default(),
            max_type_chain_depth: DEFAULT_MAX_TYPE_CHAIN_DEPTH,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    /// How stubs the provider does not know are handled.
    pub fn with_strategy(mut self, strategy: MissingContentStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Longest type chain followed before it is reported as cyclic.
    pub fn with_max_type_chain_depth(mut self, depth: usize) -> Self {
        self.max_type_chain_depth = depth;
        self
    }

    /// Abandon extension nested deeper than `depth` nodes, which happens when a recursive
    /// type is extended without limits.
    pub fn with_max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    /// Extend `node` in place within `limits`.
    pub fn extend(&self, node: &mut Node, limits: &mut Limits) -> Result<()> {
        self.extend_node(node, limits, &mut Vec::new(), 0)
    }

    fn extend_node(
        &self,
        node: &mut Node,
        limits: &mut Limits,
        chain: &mut Vec<String>,
        nesting: usize,
    ) -> Result<()> {
        if nesting > self.max_nesting {
            return Err(BlueError::Structure(format!(
                "extension nested deeper than {} levels; bound it with limits",
                self.max_nesting
            )));
        }

        if node.is_stub() {
            self.splice(node)?;
            if node.is_stub() {
                return Ok(());
            }
        }

        for slot in [
            &mut node.node_type,
            &mut node.item_type,
            &mut node.key_type,
            &mut node.value_type,
        ] {
            if let Some(type_node) = slot.as_deref_mut() {
                self.extend_type(type_node, limits, chain, nesting + 1)?;
            }
        }

        if let Some(items) = node.items.as_mut() {
            if limits.should_descend_index(0) {
                self.expand_leading_list(items)?;
            }
            for (index, item) in items.iter_mut().enumerate() {
                if !limits.should_descend_index(index) {
                    continue;
                }
                let mut scope = limits.enter(&index.to_string());
                self.extend_node(item, &mut scope, &mut Vec::new(), nesting + 1)?;
            }
        }

        if let Some(properties) = node.properties.as_mut() {
            for (key, child) in properties.iter_mut() {
                if !limits.should_descend(key) {
                    continue;
                }
                let mut scope = limits.enter(key);
                self.extend_node(child, &mut scope, &mut Vec::new(), nesting + 1)?;
            }
        }

        Ok(())
    }

    fn extend_type(
        &self,
        type_node: &mut Node,
        limits: &mut Limits,
        chain: &mut Vec<String>,
        nesting: usize,
    ) -> Result<()> {
        let Some(id) = type_node.blue_id.clone().filter(|_| type_node.is_stub()) else {
            return self.extend_node(type_node, limits, chain, nesting);
        };

        if chain.contains(&id) || chain.len() >= self.max_type_chain_depth {
            return Err(BlueError::CyclicTypeChain {
                blue_id: id,
                depth: chain.len(),
            });
        }
        chain.push(id);
        let result = self.extend_node(type_node, limits, chain, nesting);
        chain.pop();
        result
    }

    /// Replace a stub with its content. Leaves it untouched when the content is unknown
    /// and the strategy allows it.
    fn splice(&self, node: &mut Node) -> Result<()> {
        let Some(blue_id) = node.blue_id.clone() else {
            return Ok(());
        };

        let mut candidates = self.provider.fetch_by_blue_id(&blue_id);
        match candidates.len() {
            0 => self.on_missing(&blue_id),
            1 => {
                let Some(content) = candidates.pop() else {
                    return Ok(());
                };
                trace!(blue_id = %blue_id, "extended stub");
                copy_content(node, content);
                Ok(())
            }
            count => {
                trace!(blue_id = %blue_id, count, "extended stub into list");
                node.items = Some(candidates);
                Ok(())
            }
        }
    }

    /// A list whose first item names a whole sibling list gets that list spliced in place
    /// of the first item.
    fn expand_leading_list(&self, items: &mut Vec<Node>) -> Result<()> {
        let Some(first_id) = items
            .first()
            .filter(|first| first.is_stub())
            .and_then(|first| first.blue_id.clone())
        else {
            return Ok(());
        };

        let candidates = self.provider.fetch_by_blue_id(&first_id);
        if candidates.is_empty() {
            return self.on_missing(&first_id);
        }
        if candidates.len() > 1 {
            debug!(blue_id = %first_id, count = candidates.len(), "expanded leading list reference");
            items.splice(0..1, candidates);
        }
        Ok(())
    }

    fn on_missing(&self, blue_id: &str) -> Result<()> {
        // Basic types are well known even without a provider serving them
        if is_basic_type_id(blue_id) {
            return Ok(());
        }
        match self.strategy {
            MissingContentStrategy::Fail => Err(BlueError::MissingContent(blue_id.to_string())),
            MissingContentStrategy::Skip => {
                debug!(blue_id, "no content for stub, left unresolved");
                Ok(())
            }
        }
    }
}

fn copy_content(target: &mut Node, content: Node) {
    let Node {
        name,
        description,
        node_type,
        item_type,
        key_type,
        value_type,
        value,
        items,
        properties,
        blue_id: _,
        constraints,
        inline_value: _,
    } = content;

    target.name = name.or(target.name.take());
    target.description = description.or(target.description.take());
    target.node_type = node_type;
    target.item_type = item_type;
    target.key_type = key_type;
    target.value_type = value_type;
    target.value = value;
    target.items = items;
    target.properties = properties;
    target.constraints = constraints;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::TEXT_TYPE_BLUE_ID;
    use crate::provider::InMemoryProvider;

    fn registry() -> (InMemoryProvider, String, String) {
        let provider = InMemoryProvider::new();
        let city = provider
            .add(Node::new().with_name("City").with_property("country", Node::new().with_value("NO")))
            .unwrap();
        let address = provider
            .add(
                Node::new()
                    .with_name("Address")
                    .with_property("city", Node::stub(&city))
                    .with_property("street", Node::new().with_value("Main")),
            )
            .unwrap();
        (provider, address, city)
    }

    #[test]
    fn test_unbounded_extends_everything() {
        let (provider, address, _) = registry();
        let mut node = Node::stub(&address);
        NodeExtender::new(&provider).extend(&mut node, &mut Limits::Unbounded).unwrap();
        assert_eq!(node.blue_id.as_deref(), Some(address.as_str()));
        assert_eq!(node.name.as_deref(), Some("Address"));
        assert!(node.get("/city/country").is_some());
    }

    #[test]
    fn test_depth_limits_extension() {
        let (provider, address, city) = registry();
        let mut node = Node::stub(&address);
        NodeExtender::new(&provider).extend(&mut node, &mut Limits::depth(0)).unwrap();
        let city_node = node.property("city").unwrap();
        assert!(city_node.is_stub());
        assert_eq!(city_node.blue_id.as_deref(), Some(city.as_str()));
    }

    #[test]
    fn test_path_limits_extension() {
        let (provider, address, _) = registry();
        let mut node = Node::new()
            .with_property("home", Node::stub(&address))
            .with_property("work", Node::stub(&address));
        NodeExtender::new(&provider)
            .extend(&mut node, &mut Limits::path("/home/*").unwrap())
            .unwrap();
        assert!(node.get("/home/city/country").is_some());
        assert!(node.property("work").unwrap().is_stub());
    }

    #[test]
    fn test_missing_content_strategies() {
        let provider = InMemoryProvider::new();
        let mut node = Node::new().with_property("x", Node::stub("unknown-id"));

        let err = NodeExtender::new(&provider)
            .extend(&mut node.clone(), &mut Limits::Unbounded)
            .unwrap_err();
        assert!(matches!(err, BlueError::MissingContent(ref id) if id == "unknown-id"));

        NodeExtender::new(&provider)
            .with_strategy(MissingContentStrategy::Skip)
            .extend(&mut node, &mut Limits::Unbounded)
            .unwrap();
        assert!(node.property("x").unwrap().is_stub());
    }

    #[test]
    fn test_basic_type_stub_needs_no_provider() {
        let provider = InMemoryProvider::new();
        let mut node = Node::new().with_type(Node::stub(TEXT_TYPE_BLUE_ID)).with_value("x");
        NodeExtender::new(&provider).extend(&mut node, &mut Limits::Unbounded).unwrap();
        assert!(node.node_type.unwrap().is_stub());
    }

    #[test]
    fn test_multiple_candidates_become_items() {
        let provider = InMemoryProvider::new();
        let list = provider
            .add_list(vec![Node::new().with_value("a"), Node::new().with_value("b")])
            .unwrap();
        let mut node = Node::new().with_property("letters", Node::stub(&list));
        NodeExtender::new(&provider).extend(&mut node, &mut Limits::Unbounded).unwrap();
        let letters = node.property("letters").unwrap();
        assert_eq!(letters.items.as_ref().map(Vec::len), Some(2));
        assert_eq!(letters.blue_id.as_deref(), Some(list.as_str()));
    }

    #[test]
    fn test_leading_list_reference_spliced() {
        let provider = InMemoryProvider::new();
        let list = provider
            .add_list(vec![Node::new().with_value("a"), Node::new().with_value("b")])
            .unwrap();
        let mut node = Node::new().with_items(vec![Node::stub(&list), Node::new().with_value("c")]);
        NodeExtender::new(&provider).extend(&mut node, &mut Limits::Unbounded).unwrap();
        let values: Vec<String> = node
            .items
            .unwrap()
            .iter()
            .map(|n| n.value.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_type_cycle_detected() {
        let provider = |id: &str| match id {
            "a" => vec![Node::new().with_name("A").with_type(Node::stub("b"))],
            "b" => vec![Node::new().with_name("B").with_type(Node::stub("a"))],
            _ => Vec::new(),
        };
        let mut node = Node::new().with_type(Node::stub("a"));
        let err = NodeExtender::new(&provider)
            .extend(&mut node, &mut Limits::Unbounded)
            .unwrap_err();
        assert!(matches!(err, BlueError::CyclicTypeChain { .. }));
    }

    #[test]
    fn test_recursive_type_stops_at_nesting_bound() {
        let provider = InMemoryProvider::new();
        let tree = provider
            .add(
                Node::new()
                    .with_name("Tree")
                    .with_property("parent", Node::new().with_type(Node::stub("this"))),
            )
            .unwrap();

        let mut bounded = Node::new().with_type(Node::stub(&tree));
        NodeExtender::new(&provider)
            .extend(&mut bounded, &mut Limits::depth(2))
            .unwrap();
        assert!(bounded.get("/parent").is_none());
        assert_eq!(
            bounded.node_type.as_ref().unwrap().name.as_deref(),
            Some("Tree")
        );

        let mut node = Node::new().with_type(Node::stub(&tree));
        let err = NodeExtender::new(&provider)
            .extend(&mut node, &mut Limits::Unbounded)
            .unwrap_err();
        assert!(err.is_structural(), "unexpected error: {err}");

        let err = NodeExtender::new(&provider)
            .with_max_nesting(8)
            .extend(&mut Node::new().with_type(Node::stub(&tree)), &mut Limits::Unbounded)
            .unwrap_err();
        assert!(matches!(err, BlueError::Structure(ref m) if m.contains("8 levels")));
    }
}
