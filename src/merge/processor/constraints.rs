//! Constraint propagation and verification.

use std::collections::HashSet;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Zero;
use regex::Regex;
use tracing::debug;

use super::{MergeContext, MergingProcessor};
use crate::blue_id::calculate_blue_id;
use crate::error::{BlueError, Result};
use crate::model::{Constraints, Node, Scalar};

// ----------------------------------------------------------------------------
// Propagation
// ----------------------------------------------------------------------------

/// Tightens the accumulator's constraints with the source's.
///
/// | Rule | Combined |
/// |------|----------|
/// | `minLength`, `minItems`, `minimum`, `exclusiveMinimum` | larger |
/// | `maxLength`, `maxItems`, `maximum`, `exclusiveMaximum` | smaller |
/// | `required`, `uniqueItems` | true if either is |
/// | `allowMultiple` | true only if neither side forbids it |
/// | `pattern` | union; every pattern must match |
/// | `multipleOf` | least common multiple |
/// | `options` | intersection by blueId |
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintsPropagator;

impl MergingProcessor for ConstraintsPropagator {
    fn process(&self, target: &mut Node, source: &Node, _ctx: &MergeContext<'_>) -> Result<()> {
        let Some(incoming) = &source.constraints else {
            return Ok(());
        };
        target.constraints = Some(match target.constraints.take() {
            None => incoming.clone(),
            Some(existing) => tighten(existing, incoming),
        });
        Ok(())
    }
}

fn tighten(a: Constraints, b: &Constraints) -> Constraints {
    let mut pattern = a.pattern;
    for p in &b.pattern {
        if !pattern.contains(p) {
            pattern.push(p.clone());
        }
    }

    Constraints {
        required: either(a.required, b.required),
        allow_multiple: match (a.allow_multiple, b.allow_multiple) {
            (Some(x), Some(y)) => Some(x && y),
            (x, y) => x.or(y),
        },
        min_length: larger(a.min_length, b.min_length.as_ref()),
        max_length: smaller(a.max_length, b.max_length.as_ref()),
        pattern,
        minimum: larger(a.minimum, b.minimum.as_ref()),
        maximum: smaller(a.maximum, b.maximum.as_ref()),
        exclusive_minimum: larger(a.exclusive_minimum, b.exclusive_minimum.as_ref()),
        exclusive_maximum: smaller(a.exclusive_maximum, b.exclusive_maximum.as_ref()),
        multiple_of: match (a.multiple_of, &b.multiple_of) {
            (Some(x), Some(y)) => Some(decimal_lcm(&x, y)),
            (x, y) => x.or_else(|| y.clone()),
        },
        min_items: larger(a.min_items, b.min_items.as_ref()),
        max_items: smaller(a.max_items, b.max_items.as_ref()),
        unique_items: either(a.unique_items, b.unique_items),
        options: match (a.options, &b.options) {
            (Some(x), Some(y)) => {
                let allowed: HashSet<String> = y.iter().map(calculate_blue_id).collect();
                Some(x.into_iter().filter(|o| allowed.contains(&calculate_blue_id(o))).collect())
            }
            (x, y) => x.or_else(|| y.clone()),
        },
    }
}

fn either(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (None, None) => None,
        (x, y) => Some(x.unwrap_or(false) || y.unwrap_or(false)),
    }
}

fn larger<T: Ord + Clone>(a: Option<T>, b: Option<&T>) -> Option<T> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if *y > x { y.clone() } else { x }),
        (x, y) => x.or_else(|| y.cloned()),
    }
}

fn smaller<T: Ord + Clone>(a: Option<T>, b: Option<&T>) -> Option<T> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if *y < x { y.clone() } else { x }),
        (x, y) => x.or_else(|| y.cloned()),
    }
}

/// Least common multiple of two decimals, computed on integers at a shared scale.
fn decimal_lcm(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    let (ia, sa) = a.as_bigint_and_exponent();
    let (ib, sb) = b.as_bigint_and_exponent();
    let scale = sa.max(sb);
    let align = |i: BigInt, s: i64| i * BigInt::from(10).pow((scale - s) as u32);
    let lcm = align(ia, sa).lcm(&align(ib, sb));
    BigDecimal::new(lcm, scale).normalized()
}

// ----------------------------------------------------------------------------
// Verification
// ----------------------------------------------------------------------------

/// Checks the fully merged accumulator against its constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintsVerifier;

impl MergingProcessor for ConstraintsVerifier {
    fn process(&self, _target: &mut Node, _source: &Node, _ctx: &MergeContext<'_>) -> Result<()> {
        Ok(())
    }

    fn post_process(&self, target: &mut Node, _source: &Node, _ctx: &MergeContext<'_>) -> Result<()> {
        let Some(constraints) = &target.constraints else {
            return Ok(());
        };
        let result = verify(constraints, target);
        if let Err(err) = &result {
            debug!(error = %err, "constraint check failed");
        }
        result
    }
}

fn verify(c: &Constraints, node: &Node) -> Result<()> {
    let value = node.value.as_ref();
    let items = node.items.as_deref();

    if c.required == Some(true) && value.is_none() && items.is_none() {
        return Err(BlueError::constraint(
            "required",
            "none",
            true,
            "Value is required but is missing.",
        ));
    }

    if c.allow_multiple == Some(false) {
        if let Some(items) = items.filter(|items| items.len() > 1) {
            return Err(BlueError::constraint(
                "allowMultiple",
                items.len(),
                false,
                format!("Multiple items are not allowed, found {}.", items.len()),
            ));
        }
    }

    if let Some(Scalar::Text(text)) = value {
        verify_text(c, text)?;
    }

    if let Some(number) = value.and_then(Scalar::as_decimal) {
        verify_number(c, value.map(ToString::to_string).unwrap_or_default(), &number)?;
    }

    verify_items(c, items)?;

    if let Some(options) = &c.options {
        let actual = calculate_blue_id(&option_identity(node));
        if !options.iter().any(|o| calculate_blue_id(&option_identity(o)) == actual) {
            return Err(BlueError::constraint(
                "options",
                describe_value(node),
                options.len(),
                format!("Value {} is not one of the allowed options.", describe_value(node)),
            ));
        }
    }

    Ok(())
}

fn verify_text(c: &Constraints, text: &str) -> Result<()> {
    let length = text.chars().count();
    if let Some(min) = c.min_length.filter(|min| length < *min) {
        return Err(BlueError::constraint(
            "minLength",
            length,
            min,
            format!(
                "Value \"{}\" is shorter than the minimum length of {} (length {}).",
                text, min, length
            ),
        ));
    }
    if let Some(max) = c.max_length.filter(|max| length > *max) {
        return Err(BlueError::constraint(
            "maxLength",
            length,
            max,
            format!(
                "Value \"{}\" is longer than the maximum length of {} (length {}).",
                text, max, length
            ),
        ));
    }
    for pattern in &c.pattern {
        let anchored = Regex::new(&format!("^(?:{})$", pattern))?;
        if !anchored.is_match(text) {
            return Err(BlueError::constraint(
                "pattern",
                text,
                pattern,
                format!("Value \"{}\" does not match the required pattern \"{}\".", text, pattern),
            ));
        }
    }
    Ok(())
}

fn verify_number(c: &Constraints, shown: String, number: &BigDecimal) -> Result<()> {
    let bound = |name: &'static str, limit: &BigDecimal, relation: &str| {
        BlueError::constraint(
            name,
            &shown,
            limit,
            format!("Value {} is {} {}.", shown, relation, limit),
        )
    };

    if let Some(min) = c.minimum.as_ref().filter(|min| number < *min) {
        return Err(bound("minimum", min, "less than the minimum value of"));
    }
    if let Some(max) = c.maximum.as_ref().filter(|max| number > *max) {
        return Err(bound("maximum", max, "greater than the maximum value of"));
    }
    if let Some(min) = c.exclusive_minimum.as_ref().filter(|min| number <= *min) {
        return Err(bound(
            "exclusiveMinimum",
            min,
            "less than or equal to the exclusive minimum value of",
        ));
    }
    if let Some(max) = c.exclusive_maximum.as_ref().filter(|max| number >= *max) {
        return Err(bound(
            "exclusiveMaximum",
            max,
            "greater than or equal to the exclusive maximum value of",
        ));
    }
    if let Some(step) = &c.multiple_of {
        if step.is_zero() {
            return Err(BlueError::InvalidDocument(
                "multipleOf must not be zero".to_string(),
            ));
        }
        if !(number % step).is_zero() {
            return Err(bound("multipleOf", step, "not a multiple of"));
        }
    }
    Ok(())
}

fn verify_items(c: &Constraints, items: Option<&[Node]>) -> Result<()> {
    let count = items.map_or(0, <[Node]>::len);
    if let Some(min) = c.min_items.filter(|min| count < *min) {
        return Err(count_error("minItems", count, min, "less than the minimum required items of"));
    }
    if let Some(max) = c.max_items.filter(|max| count > *max) {
        return Err(count_error("maxItems", count, max, "greater than the maximum allowed items of"));
    }
    if c.unique_items == Some(true) {
        if let Some(items) = items {
            let distinct: HashSet<String> = items.iter().map(calculate_blue_id).collect();
            if distinct.len() != items.len() {
                return Err(BlueError::constraint(
                    "uniqueItems",
                    items.len() - distinct.len(),
                    true,
                    "Unique items are required, but some items are identical.",
                ));
            }
        }
    }
    Ok(())
}

fn count_error(name: &'static str, count: usize, limit: usize, relation: &str) -> BlueError {
    BlueError::constraint(
        name,
        count,
        limit,
        format!("Number of items {} is {} {}.", count, relation, limit),
    )
}

/// The part of a node compared against `options`: its value or items.
fn option_identity(node: &Node) -> Node {
    Node {
        value: node.value.clone(),
        items: node.items.clone(),
        ..Node::default()
    }
}

fn describe_value(node: &Node) -> String {
    node.value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("[{} items]", node.items.as_ref().map_or(0, Vec::len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn check(node: Node) -> Result<()> {
        let provider = |_: &str| Vec::<Node>::new();
        let ctx = MergeContext::new(&provider, 8);
        let mut target = node;
        ConstraintsVerifier.post_process(&mut target, &Node::new(), &ctx)
    }

    #[test]
    fn test_min_length_reports_actual_length() {
        let node = Node::new()
            .with_value("ab")
            .with_constraints(Constraints::new().with_min_length(3));
        match check(node).unwrap_err() {
            BlueError::ConstraintViolation { constraint, value, limit, message } => {
                assert_eq!(constraint, "minLength");
                assert_eq!(value, "2");
                assert_eq!(limit, "3");
                assert!(message.contains("length 2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_length_counts_characters() {
        let node = Node::new()
            .with_value("żółw")
            .with_constraints(Constraints::new().with_max_length(4));
        check(node).unwrap();
    }

    #[test]
    fn test_pattern_matches_whole_value() {
        let constraints = Constraints::new().with_pattern("[a-z]+");
        check(Node::new().with_value("abc").with_constraints(constraints.clone())).unwrap();
        let err = check(Node::new().with_value("abc1").with_constraints(constraints)).unwrap_err();
        assert!(err.to_string().contains("pattern"));
    }

    #[test]
    fn test_numeric_bounds() {
        let c = Constraints::new()
            .with_minimum(dec("1"))
            .with_exclusive_maximum(dec("10"))
            .with_multiple_of(dec("0.5"));
        check(Node::new().with_value(5).with_constraints(c.clone())).unwrap();
        check(Node::new().with_value(Scalar::from_f64(2.5).unwrap()).with_constraints(c.clone())).unwrap();
        assert!(check(Node::new().with_value(0).with_constraints(c.clone())).is_err());
        assert!(check(Node::new().with_value(10).with_constraints(c.clone())).is_err());
        assert!(check(Node::new().with_value(Scalar::from_f64(2.2).unwrap()).with_constraints(c)).is_err());
    }

    #[test]
    fn test_required_and_items() {
        let required = Constraints::new().with_required(true);
        assert!(check(Node::new().with_constraints(required.clone())).is_err());
        check(Node::new().with_value(false).with_constraints(required)).unwrap();

        let c = Constraints::new().with_min_items(1).with_max_items(2).with_unique_items(true);
        let a = Node::new().with_value("a");
        check(Node::new().with_items(vec![a.clone()]).with_constraints(c.clone())).unwrap();
        assert!(check(Node::new().with_items(vec![]).with_constraints(c.clone())).is_err());
        assert!(check(Node::new().with_items(vec![a.clone(), a.clone()]).with_constraints(c.clone())).is_err());
        assert!(check(Node::new().with_items(vec![a.clone(), a.clone(), a]).with_constraints(c)).is_err());
    }

    #[test]
    fn test_allow_multiple() {
        let c = Constraints::new().with_allow_multiple(false);
        let items = vec![Node::new().with_value(1), Node::new().with_value(2)];
        assert!(check(Node::new().with_items(items.clone()).with_constraints(c)).is_err());
        check(Node::new().with_items(items)).unwrap();
    }

    #[test]
    fn test_options() {
        let c = Constraints::new().with_options(vec![Node::new().with_value("red"), Node::new().with_value("green")]);
        check(Node::new().with_value("red").with_constraints(c.clone())).unwrap();
        let err = check(Node::new().with_value("blue").with_constraints(c)).unwrap_err();
        assert!(matches!(err, BlueError::ConstraintViolation { constraint: "options", .. }));
    }

    #[test]
    fn test_propagation_tightens() {
        let provider = |_: &str| Vec::<Node>::new();
        let ctx = MergeContext::new(&provider, 8);
        let mut target = Node::new().with_constraints(
            Constraints::new()
                .with_min_length(2)
                .with_max_length(10)
                .with_multiple_of(dec("4"))
                .with_pattern("a.*"),
        );
        let source = Node::new().with_constraints(
            Constraints::new()
                .with_min_length(1)
                .with_max_length(5)
                .with_multiple_of(dec("6"))
                .with_pattern("a.*")
                .with_pattern(".*z")
                .with_required(true),
        );
        ConstraintsPropagator.process(&mut target, &source, &ctx).unwrap();
        let c = target.constraints.unwrap();
        assert_eq!(c.min_length, Some(2));
        assert_eq!(c.max_length, Some(5));
        assert_eq!(c.multiple_of, Some(dec("12")));
        assert_eq!(c.pattern, vec!["a.*".to_string(), ".*z".to_string()]);
        assert_eq!(c.required, Some(true));
    }

    #[test]
    fn test_decimal_lcm() {
        assert_eq!(decimal_lcm(&dec("0.5"), &dec("0.75")), dec("1.5"));
        assert_eq!(decimal_lcm(&dec("3"), &dec("5")), dec("15"));
    }

    #[test]
    fn test_option_intersection() {
        let red = Node::new().with_value("red");
        let green = Node::new().with_value("green");
        let blue = Node::new().with_value("blue");
        let merged = tighten(
            Constraints::new().with_options(vec![red.clone(), green.clone()]),
            &Constraints::new().with_options(vec![green.clone(), blue]),
        );
        assert_eq!(merged.options, Some(vec![green]));
    }
}
