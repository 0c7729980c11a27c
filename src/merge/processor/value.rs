//! Scalar value propagation.

use super::{MergeContext, MergingProcessor};
use crate::error::{BlueError, Result};
use crate::model::{Node, Scalar};

/// Copies the source's value into the accumulator, refusing to overwrite a different one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuePropagator;

impl MergingProcessor for ValuePropagator {
    fn process(&self, target: &mut Node, source: &Node, _ctx: &MergeContext<'_>) -> Result<()> {
        let Some(source_value) = &source.value else {
            return Ok(());
        };
        match &target.value {
            None => target.value = Some(source_value.clone()),
            Some(existing) if same_value(existing, source_value) => {}
            Some(existing) => {
                return Err(BlueError::ValueConflict {
                    existing: existing.to_string(),
                    source_value: source_value.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Numbers compare by numeric value across integer and decimal forms.
fn same_value(a: &Scalar, b: &Scalar) -> bool {
    match (a.as_decimal(), b.as_decimal()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn test_propagation_and_conflict() {
        let provider = |_: &str| Vec::<Node>::new();
        let ctx = MergeContext::new(&provider, 8);

        let mut target = Node::new();
        ValuePropagator.process(&mut target, &Node::new().with_value("a"), &ctx).unwrap();
        assert_eq!(target.value, Some(Scalar::from("a")));

        ValuePropagator.process(&mut target, &Node::new().with_value("a"), &ctx).unwrap();
        let err = ValuePropagator
            .process(&mut target, &Node::new().with_value("b"), &ctx)
            .unwrap_err();
        assert!(matches!(err, BlueError::ValueConflict { .. }));
    }

    #[test]
    fn test_numeric_equality() {
        let one = Scalar::from(1);
        let one_point_zero = Scalar::Decimal(BigDecimal::from_str("1.0").unwrap());
        assert!(same_value(&one, &one_point_zero));
        assert!(!same_value(&one, &Scalar::from("1")));
    }
}
