//! Values must fit the basic type at the root of the chain.

use super::type_assigner::describe;
use super::{MergeContext, MergingProcessor};
use crate::error::{BlueError, Result};
use crate::model::Node;
use crate::typing::value_conforms;

/// Checks the accumulator's value against the basic type its type chain reaches.
///
/// Runs after value propagation, so an inherited type is checked against a source value
/// and vice versa. Types that reach no basic type accept any value.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicTypesVerifier;

impl MergingProcessor for BasicTypesVerifier {
    fn process(&self, target: &mut Node, _source: &Node, ctx: &MergeContext<'_>) -> Result<()> {
        let (Some(value), Some(type_node)) = (&target.value, target.node_type.as_deref()) else {
            return Ok(());
        };
        let Some(basic) = ctx.basic_type_of(type_node)? else {
            return Ok(());
        };
        if !value_conforms(basic, value) {
            return Err(BlueError::TypeMismatch(format!(
                "value {} does not conform to type {} (a {} type)",
                value,
                describe(type_node),
                basic
            )));
        }
        Ok(())
    }
}
