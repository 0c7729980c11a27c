//! Item type propagation and item conformance for lists.

use super::type_assigner::describe;
use super::{MergeContext, MergingProcessor};
use crate::error::{BlueError, Result};
use crate::model::Node;

/// Propagates `itemType` and checks that typed items conform to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListProcessor;

impl MergingProcessor for ListProcessor {
    fn process(&self, target: &mut Node, source: &Node, ctx: &MergeContext<'_>) -> Result<()> {
        if let Some(source_item_type) = source.item_type.as_deref() {
            let is_list = match source.node_type.as_deref() {
                Some(t) => ctx.is_list_type(t)?,
                None => false,
            };
            if !is_list {
                return Err(BlueError::TypeMismatch(
                    "a node with itemType must have a List type".to_string(),
                ));
            }

            if let Some(target_item_type) = target.item_type.as_deref() {
                if !ctx.is_subtype(source_item_type, target_item_type)? {
                    return Err(BlueError::TypeMismatch(format!(
                        "the source item type {} is not a subtype of the target item type {}",
                        describe(source_item_type),
                        describe(target_item_type)
                    )));
                }
            }
            target.item_type = Some(Box::new(source_item_type.clone()));
        }

        let (Some(item_type), Some(items)) = (target.item_type.as_deref(), source.items.as_ref()) else {
            return Ok(());
        };
        for (index, item) in items.iter().enumerate() {
            let Some(actual) = item.node_type.as_deref() else {
                continue;
            };
            if !ctx.is_subtype(actual, item_type)? {
                return Err(BlueError::TypeMismatch(format!(
                    "item {} of type {} is not a subtype of the list's item type {}",
                    index,
                    describe(actual),
                    describe(item_type)
                )));
            }
        }
        Ok(())
    }
}
