//! `value` and `items` are mutually exclusive.

use super::{MergeContext, MergingProcessor};
use crate::error::{BlueError, Result};
use crate::model::Node;

/// Rejects nodes that would end up with both a value and items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExclusiveItemsOrValue;

impl MergingProcessor for ExclusiveItemsOrValue {
    fn process(&self, target: &mut Node, source: &Node, _ctx: &MergeContext<'_>) -> Result<()> {
        if source.value.is_some() && source.items.is_some() {
            return Err(BlueError::Structure(
                "node cannot have both value and items set".to_string(),
            ));
        }
        let mixed = (target.value.is_some() && source.items.is_some())
            || (target.items.is_some() && source.value.is_some());
        if mixed {
            return Err(BlueError::Structure(
                "node inherits items but sets a value, or inherits a value but sets items".to_string(),
            ));
        }
        Ok(())
    }
}
