//! Key and value type propagation for dictionaries.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use super::type_assigner::describe;
use super::{MergeContext, MergingProcessor};
use crate::error::{BlueError, Result};
use crate::model::Node;
use crate::protocol::constants::{BOOLEAN_TYPE, DOUBLE_TYPE, INTEGER_TYPE, TEXT_TYPE};

/// Propagates `keyType`/`valueType` and checks dictionary entries against them.
///
/// Keys are property names, so a key type must be one of the scalar basic types; each key
/// must parse as that type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryProcessor;

impl MergingProcessor for DictionaryProcessor {
    fn process(&self, target: &mut Node, source: &Node, ctx: &MergeContext<'_>) -> Result<()> {
        if source.key_type.is_some() || source.value_type.is_some() {
            let is_dictionary = match source.node_type.as_deref() {
                Some(t) => ctx.is_dictionary_type(t)?,
                None => false,
            };
            if !is_dictionary {
                return Err(BlueError::TypeMismatch(
                    "a node with keyType or valueType must have a Dictionary type".to_string(),
                ));
            }
        }

        if let Some(source_key_type) = source.key_type.as_deref() {
            key_kind(source_key_type, ctx)?;
            refine(&mut target.key_type, source_key_type, "key", ctx)?;
        }
        if let Some(source_value_type) = source.value_type.as_deref() {
            refine(&mut target.value_type, source_value_type, "value", ctx)?;
        }

        let Some(properties) = &source.properties else {
            return Ok(());
        };
        if let Some(key_type) = target.key_type.as_deref() {
            let kind = key_kind(key_type, ctx)?;
            for key in properties.keys() {
                check_key(key, kind)?;
            }
        }
        if let Some(value_type) = target.value_type.as_deref() {
            for (key, entry) in properties {
                let Some(actual) = entry.node_type.as_deref() else {
                    continue;
                };
                if !ctx.is_subtype(actual, value_type)? {
                    return Err(BlueError::TypeMismatch(format!(
                        "entry '{}' of type {} is not a subtype of the dictionary's value type {}",
                        key,
                        describe(actual),
                        describe(value_type)
                    )));
                }
            }
        }
        Ok(())
    }
}

fn refine(
    slot: &mut Option<Box<Node>>,
    source: &Node,
    role: &str,
    ctx: &MergeContext<'_>,
) -> Result<()> {
    if let Some(existing) = slot.as_deref() {
        if !ctx.is_subtype(source, existing)? {
            return Err(BlueError::TypeMismatch(format!(
                "the source {} type {} is not a subtype of the target {} type {}",
                role,
                describe(source),
                role,
                describe(existing)
            )));
        }
    }
    *slot = Some(Box::new(source.clone()));
    Ok(())
}

fn key_kind(key_type: &Node, ctx: &MergeContext<'_>) -> Result<&'static str> {
    match ctx.basic_type_of(key_type)? {
        Some(kind @ (TEXT_TYPE | INTEGER_TYPE | DOUBLE_TYPE | BOOLEAN_TYPE)) => Ok(kind),
        _ => Err(BlueError::TypeMismatch(format!(
            "dictionary key type {} must be Text, Integer, Double or Boolean",
            describe(key_type)
        ))),
    }
}

fn check_key(key: &str, kind: &str) -> Result<()> {
    let valid = match kind {
        INTEGER_TYPE => BigInt::from_str(key).is_ok(),
        DOUBLE_TYPE => BigDecimal::from_str(key).is_ok(),
        BOOLEAN_TYPE => key.eq_ignore_ascii_case("true") || key.eq_ignore_ascii_case("false"),
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(BlueError::TypeMismatch(format!(
            "key '{}' is not a valid {}",
            key, kind
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{
        DICTIONARY_TYPE_BLUE_ID, INTEGER_TYPE_BLUE_ID, LIST_TYPE_BLUE_ID, TEXT_TYPE_BLUE_ID,
    };

    fn dictionary(key: &str, value: &str) -> Node {
        Node::new()
            .with_type(Node::stub(DICTIONARY_TYPE_BLUE_ID))
            .with_key_type(Node::stub(key))
            .with_value_type(Node::stub(value))
    }

    #[test]
    fn test_keys_validated() {
        let provider = |_: &str| Vec::<Node>::new();
        let ctx = MergeContext::new(&provider, 8);
        let mut target = Node::new();
        DictionaryProcessor
            .process(&mut target, &dictionary(INTEGER_TYPE_BLUE_ID, TEXT_TYPE_BLUE_ID), &ctx)
            .unwrap();

        let good = Node::new().with_property("12", Node::new().with_type(Node::stub(TEXT_TYPE_BLUE_ID)));
        DictionaryProcessor.process(&mut target, &good, &ctx).unwrap();

        let bad_key = Node::new().with_property("twelve", Node::new());
        assert!(DictionaryProcessor.process(&mut target, &bad_key, &ctx).is_err());

        let bad_value = Node::new().with_property("3", Node::new().with_type(Node::stub(INTEGER_TYPE_BLUE_ID)));
        assert!(DictionaryProcessor.process(&mut target, &bad_value, &ctx).is_err());
    }

    #[test]
    fn test_key_type_must_be_scalar_basic() {
        let provider = |_: &str| Vec::<Node>::new();
        let ctx = MergeContext::new(&provider, 8);
        let source = dictionary(LIST_TYPE_BLUE_ID, TEXT_TYPE_BLUE_ID);
        assert!(DictionaryProcessor.process(&mut Node::new(), &source, &ctx).is_err());
    }

    #[test]
    fn test_requires_dictionary_type() {
        let provider = |_: &str| Vec::<Node>::new();
        let ctx = MergeContext::new(&provider, 8);
        let source = Node::new().with_value_type(Node::stub(TEXT_TYPE_BLUE_ID));
        let err = DictionaryProcessor.process(&mut Node::new(), &source, &ctx).unwrap_err();
        assert!(err.to_string().contains("Dictionary"));
    }

    #[test]
    fn test_boolean_keys() {
        assert!(check_key("TRUE", BOOLEAN_TYPE).is_ok());
        assert!(check_key("yes", BOOLEAN_TYPE).is_err());
        assert!(check_key("1.5", DOUBLE_TYPE).is_ok());
    }
}
