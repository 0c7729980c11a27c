//! Definitions of the built-in basic types.

use crate::model::Node;
use crate::protocol::constants::BASIC_TYPES;

use super::NodeProvider;

/// Serves the six basic type definitions (`Text`, `Double`, `Integer`, `Boolean`, `List`,
/// `Dictionary`) under their well-known ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapProvider;

impl BootstrapProvider {
    /// A provider holding the six basic types.
    pub fn new() -> Self {
        Self
    }

    /// The definition node of a basic type.
    pub fn definition(name: &str) -> Node {
        Node::new()
            .with_name(name)
            .with_description(format!("Built-in {} type", name))
    }
}

impl NodeProvider for BootstrapProvider {
    fn fetch_by_blue_id(&self, blue_id: &str) -> Vec<Node> {
        BASIC_TYPES
            .iter()
            .find(|(_, id)| *id == blue_id)
            .map(|(name, id)| vec![Self::definition(name).with_blue_id(*id)])
            .unwrap_or_default()
    }
}
