//! Canonical form of a node and its JSON serialization.
//!
//! A node is first flattened into a [`Canonical`] tree of maps, lists and scalars. Empty
//! maps and lists are dropped on the way, and untyped values get a synthesized basic
//! `type`. The tree is then serialized with sorted keys and no whitespace, which is what
//! gets hashed.

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::model::{Constraints, Node, Scalar};
use crate::protocol::constants::*;

/// A canonical value ready for hashing.
#[derive(Debug, Clone, PartialEq)]
pub enum Canonical {
    /// Text value
    Text(String),
    /// Exact integer
    Integer(BigInt),
    /// Exact decimal
    Decimal(BigDecimal),
    /// Boolean
    Boolean(bool),
    /// Ordered list
    List(Vec<Canonical>),
    /// Keys iterate in code-point order
    Map(BTreeMap<String, Canonical>),
}

impl Canonical {
    /// Single-entry `{"blueId": id}` map.
    pub fn blue_id_ref(blue_id: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(BLUE_ID.to_string(), Canonical::Text(blue_id.into()));
        Canonical::Map(map)
    }

    /// Serialize canonically: sorted keys, no whitespace, exact number text.
    pub fn to_json(&self) -> String {
        let mut out = String::new();
        write_json(self, &mut out);
        out
    }
}

// ----------------------------------------------------------------------------
// Node -> Canonical
// ----------------------------------------------------------------------------

/// Canonical form of a node, or `None` when nothing survives cleaning.
pub fn from_node(node: &Node) -> Option<Canonical> {
    let mut map = BTreeMap::new();

    if let Some(name) = &node.name {
        map.insert(NAME.to_string(), Canonical::Text(name.clone()));
    }
    if let Some(description) = &node.description {
        map.insert(DESCRIPTION.to_string(), Canonical::Text(description.clone()));
    }

    match (&node.node_type, &node.value) {
        (Some(node_type), _) => insert_node(&mut map, TYPE, node_type),
        (None, Some(value)) => {
            map.insert(TYPE.to_string(), Canonical::blue_id_ref(inferred_type_id(value)));
        }
        (None, None) => {}
    }

    insert_opt_node(&mut map, ITEM_TYPE, node.item_type.as_deref());
    insert_opt_node(&mut map, KEY_TYPE, node.key_type.as_deref());
    insert_opt_node(&mut map, VALUE_TYPE, node.value_type.as_deref());

    if let Some(value) = &node.value {
        map.insert(VALUE.to_string(), from_scalar(value));
    }
    if let Some(items) = &node.items {
        if let Some(list) = from_nodes(items) {
            map.insert(ITEMS.to_string(), list);
        }
    }
    if let Some(blue_id) = &node.blue_id {
        map.insert(BLUE_ID.to_string(), Canonical::Text(blue_id.clone()));
    }
    if let Some(constraints) = &node.constraints {
        if let Some(c) = from_constraints(constraints) {
            map.insert(CONSTRAINTS.to_string(), c);
        }
    }
    if let Some(properties) = &node.properties {
        for (key, value) in properties {
            insert_node(&mut map, key, value);
        }
    }

    (!map.is_empty()).then_some(Canonical::Map(map))
}

/// Canonical form of a node list, or `None` when every item cleans away.
pub fn from_nodes(nodes: &[Node]) -> Option<Canonical> {
    let list: Vec<Canonical> = nodes.iter().filter_map(from_node).collect();
    (!list.is_empty()).then_some(Canonical::List(list))
}

fn insert_node(map: &mut BTreeMap<String, Canonical>, key: &str, node: &Node) {
    if let Some(c) = from_node(node) {
        map.insert(key.to_string(), c);
    }
}

fn insert_opt_node(map: &mut BTreeMap<String, Canonical>, key: &str, node: Option<&Node>) {
    if let Some(node) = node {
        insert_node(map, key, node);
    }
}

/// Integers beyond the IEEE-754 safe range are emitted as text.
fn from_scalar(value: &Scalar) -> Canonical {
    match value {
        Scalar::Text(s) => Canonical::Text(s.clone()),
        Scalar::Boolean(b) => Canonical::Boolean(*b),
        Scalar::Decimal(d) => Canonical::Decimal(d.clone()),
        Scalar::Integer(i) => {
            let limit = BigInt::from(MAX_SAFE_INTEGER);
            if *i > limit || *i < -limit {
                Canonical::Text(i.to_string())
            } else {
                Canonical::Integer(i.clone())
            }
        }
    }
}

/// BlueId of the basic type matching a value's runtime kind.
pub fn inferred_type_id(value: &Scalar) -> &'static str {
    match value {
        Scalar::Text(_) => TEXT_TYPE_BLUE_ID,
        Scalar::Integer(_) => INTEGER_TYPE_BLUE_ID,
        Scalar::Decimal(_) => DOUBLE_TYPE_BLUE_ID,
        Scalar::Boolean(_) => BOOLEAN_TYPE_BLUE_ID,
    }
}

fn from_constraints(c: &Constraints) -> Option<Canonical> {
    let mut map = BTreeMap::new();

    let flags = [
        ("required", c.required),
        ("allowMultiple", c.allow_multiple),
        ("uniqueItems", c.unique_items),
    ];
    for (key, flag) in flags {
        if let Some(flag) = flag {
            map.insert(key.to_string(), Canonical::Boolean(flag));
        }
    }

    let counts = [
        ("minLength", c.min_length),
        ("maxLength", c.max_length),
        ("minItems", c.min_items),
        ("maxItems", c.max_items),
    ];
    for (key, count) in counts {
        if let Some(count) = count {
            map.insert(key.to_string(), Canonical::Integer(BigInt::from(count)));
        }
    }

    let bounds = [
        ("minimum", &c.minimum),
        ("maximum", &c.maximum),
        ("exclusiveMinimum", &c.exclusive_minimum),
        ("exclusiveMaximum", &c.exclusive_maximum),
        ("multipleOf", &c.multiple_of),
    ];
    for (key, bound) in bounds {
        if let Some(bound) = bound {
            map.insert(key.to_string(), Canonical::Decimal(bound.clone()));
        }
    }

    if !c.pattern.is_empty() {
        let patterns = c.pattern.iter().cloned().map(Canonical::Text).collect();
        map.insert("pattern".to_string(), Canonical::List(patterns));
    }
    if let Some(options) = c.options.as_deref().and_then(from_nodes) {
        map.insert("options".to_string(), options);
    }

    (!map.is_empty()).then_some(Canonical::Map(map))
}

// ----------------------------------------------------------------------------
// Serialization
// ----------------------------------------------------------------------------

fn write_json(value: &Canonical, out: &mut String) {
    match value {
        Canonical::Text(s) => write_string(s, out),
        Canonical::Integer(i) => out.push_str(&i.to_string()),
        Canonical::Decimal(d) => out.push_str(&d.to_string()),
        Canonical::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Canonical::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json(item, out);
            }
            out.push(']');
        }
        Canonical::Map(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_json(item, out);
            }
            out.push('}');
        }
    }
}

/// JSON string escaping: quote, backslash and control characters only.
fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_untyped_value_gets_basic_type() {
        let c = from_node(&Node::new().with_value("x")).unwrap();
        assert_eq!(
            c.to_json(),
            format!(r#"{{"type":{{"blueId":"{}"}},"value":"x"}}"#, TEXT_TYPE_BLUE_ID)
        );
    }

    #[test]
    fn test_empty_structures_are_dropped() {
        assert!(from_node(&Node::new()).is_none());
        let node = Node::new()
            .with_items(vec![Node::new()])
            .with_property("empty", Node::new());
        assert!(from_node(&node).is_none());
    }

    #[test]
    fn test_keys_sorted_and_escaped() {
        let node = Node::new()
            .with_name("a\"b\n")
            .with_property("zeta", Node::stub("z"))
            .with_property("Alpha", Node::stub("a"));
        let json = from_node(&node).unwrap().to_json();
        assert_eq!(
            json,
            r#"{"Alpha":{"blueId":"a"},"name":"a\"b\n","zeta":{"blueId":"z"}}"#
        );
    }

    #[test]
    fn test_decimal_keeps_trailing_zeros() {
        let c = from_scalar(&Scalar::Decimal(BigDecimal::from_str("2.50").unwrap()));
        assert_eq!(c.to_json(), "2.50");
    }

    #[test]
    fn test_large_integer_becomes_text() {
        let big = BigInt::from(MAX_SAFE_INTEGER) + 1;
        assert_eq!(from_scalar(&Scalar::Integer(big)).to_json(), "\"9007199254740992\"");
        assert_eq!(
            from_scalar(&Scalar::from(MAX_SAFE_INTEGER)).to_json(),
            "9007199254740991"
        );
    }

    #[test]
    fn test_control_character_escape() {
        let mut out = String::new();
        write_string("\u{1}", &mut out);
        assert_eq!(out, "\"\\u0001\"");
    }
}
