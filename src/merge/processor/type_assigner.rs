//! Type assignment and the subtype check between merge levels.

use tracing::debug;

use super::{MergeContext, MergingProcessor};
use crate::error::{BlueError, Result};
use crate::model::Node;

/// Gives the accumulator the source's type once it is known to be compatible.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeAssigner;

impl MergingProcessor for TypeAssigner {
    fn process(&self, target: &mut Node, source: &Node, ctx: &MergeContext<'_>) -> Result<()> {
        let Some(source_type) = source.node_type.as_deref() else {
            return Ok(());
        };
        if let Some(target_type) = target.node_type.as_deref() {
            if !ctx.is_subtype(source_type, target_type)? {
                let message = format!(
                    "the source type {} is not a subtype of the target type {}",
                    describe(source_type),
                    describe(target_type)
                );
                debug!(%message, "type assignment rejected");
                return Err(BlueError::TypeMismatch(message));
            }
        }
        target.node_type = Some(Box::new(source_type.clone()));
        Ok(())
    }
}

/// Short human-readable name for a type node in error messages.
pub(super) fn describe(type_node: &Node) -> String {
    match (&type_node.name, &type_node.blue_id) {
        (Some(name), _) => format!("'{}'", name),
        (None, Some(id)) => format!("'{}'", id),
        (None, None) => format!("'{}'", crate::blue_id::calculate_blue_id(type_node)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with(provider: &dyn crate::provider::NodeProvider) -> MergeContext<'_> {
        MergeContext::new(provider, 16)
    }

    #[test]
    fn test_assigns_when_absent() {
        let provider = |_: &str| Vec::<Node>::new();
        let mut target = Node::new();
        let source = Node::new().with_type(Node::new().with_name("T"));
        TypeAssigner.process(&mut target, &source, &ctx_with(&provider)).unwrap();
        assert_eq!(target.node_type.unwrap().name.as_deref(), Some("T"));
    }

    #[test]
    fn test_narrows_to_subtype() {
        let provider = |_: &str| Vec::<Node>::new();
        let animal = Node::new().with_name("Animal");
        let dog = Node::new().with_name("Dog").with_type(animal.clone());
        let mut target = Node::new().with_type(animal.clone());

        TypeAssigner
            .process(&mut target, &Node::new().with_type(dog.clone()), &ctx_with(&provider))
            .unwrap();
        assert_eq!(target.node_type.as_deref(), Some(&dog));

        let err = TypeAssigner
            .process(&mut target, &Node::new().with_type(animal), &ctx_with(&provider))
            .unwrap_err();
        assert!(err.is_type_error());
        assert!(err.to_string().contains("'Animal'"));
    }
}
