//! Conversion between JSON documents and [`Node`] trees.
//!
//! # Document Shape
//!
//! | Key | Node field | Accepted JSON |
//! |-----|------------|---------------|
//! | `name`, `description` | informational text | string |
//! | `type`, `itemType`, `keyType`, `valueType` | type node | object, or a bare type name |
//! | `value` | scalar | string, number, boolean |
//! | `items` | item list | array |
//! | `blueId` | content id | string |
//! | `constraints` | [`Constraints`] | object |
//! | anything else | property | any |
//!
//! A bare scalar stands for `{"value": ...}` and a bare array for `{"items": [...]}`, at the
//! top level and in property or item positions alike. A bare string in a type position is
//! kept as an inline type name (`"type": "Text"`), which
//! [`preprocess`](crate::preprocess) later replaces with the built-in type's blueId.
//!
//! # Examples
//!
//! ```
//! use blue_language::protocol::{node_from_json, node_to_json};
//! use serde_json::json;
//!
//! let doc = json!({"name": "Counter", "count": 5, "tags": ["a", "b"]});
//! let node = node_from_json(&doc).unwrap();
//! assert_eq!(node.name.as_deref(), Some("Counter"));
//! assert_eq!(node.property("tags").unwrap().items.as_ref().unwrap().len(), 2);
//! assert_eq!(node_to_json(&node), doc);
//! ```

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use super::constants::*;
use crate::error::{BlueError, Result};
use crate::model::{Constraints, Node, Scalar};

// ----------------------------------------------------------------------------
// Decoding
// ----------------------------------------------------------------------------

/// Decode a JSON document into a node.
pub fn node_from_json(value: &Value) -> Result<Node> {
    match value {
        Value::Object(map) => object_to_node(map),
        Value::Array(items) => Ok(Node::new().with_items(decode_items(items)?)),
        Value::Null => Err(BlueError::InvalidDocument(
            "null cannot be decoded as a node".to_string(),
        )),
        scalar => Ok(Node::new().with_value(json_to_scalar(scalar)?)),
    }
}

fn decode_items(items: &[Value]) -> Result<Vec<Node>> {
    items
        .iter()
        .map(|item| match item {
            Value::Null => Ok(Node::new()),
            other => node_from_json(other),
        })
        .collect()
}

fn object_to_node(map: &Map<String, Value>) -> Result<Node> {
    let mut node = Node::new();

    for (key, value) in map {
        match key.as_str() {
            NAME => node.name = Some(expect_string(key, value)?),
            DESCRIPTION => node.description = Some(expect_string(key, value)?),
            TYPE => node.node_type = Some(Box::new(decode_type(value)?)),
            ITEM_TYPE => node.item_type = Some(Box::new(decode_type(value)?)),
            KEY_TYPE => node.key_type = Some(Box::new(decode_type(value)?)),
            VALUE_TYPE => node.value_type = Some(Box::new(decode_type(value)?)),
            VALUE => {
                if !value.is_null() {
                    node.value = Some(json_to_scalar(value)?);
                }
            }
            ITEMS => match value {
                Value::Array(items) => node.items = Some(decode_items(items)?),
                Value::Null => {}
                _ => {
                    return Err(BlueError::InvalidDocument(
                        "items must be an array".to_string(),
                    ))
                }
            },
            BLUE_ID => node.blue_id = Some(expect_string(key, value)?),
            CONSTRAINTS => node.constraints = Some(constraints_from_json(value)?),
            _ => {
                if !value.is_null() {
                    node.properties_mut()
                        .insert(key.clone(), node_from_json(value)?);
                }
            }
        }
    }

    coerce_typed_text(&mut node);
    Ok(node)
}

fn decode_type(value: &Value) -> Result<Node> {
    match value {
        Value::String(name) => Ok(Node::new().with_value(name.as_str()).with_inline_value(true)),
        other => node_from_json(other),
    }
}

/// Numbers typed `Integer`/`Double` may be written as strings to keep their precision.
fn coerce_typed_text(node: &mut Node) {
    let Some(Scalar::Text(text)) = &node.value else {
        return;
    };
    let Some(type_node) = node.node_type.as_deref() else {
        return;
    };

    let is_named = |name: &str, id: &str| {
        type_node.blue_id.as_deref() == Some(id)
            || (type_node.inline_value
                && type_node.value.as_ref().and_then(Scalar::as_text) == Some(name))
    };

    if is_named(INTEGER_TYPE, INTEGER_TYPE_BLUE_ID) {
        if let Ok(parsed) = BigInt::from_str(text) {
            node.value = Some(Scalar::Integer(parsed));
        }
    } else if is_named(DOUBLE_TYPE, DOUBLE_TYPE_BLUE_ID) {
        if let Ok(parsed) = BigDecimal::from_str(text) {
            node.value = Some(Scalar::Decimal(parsed));
        }
    }
}

fn expect_string(key: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| BlueError::InvalidDocument(format!("{} must be a string", key)))
}

/// Decode a JSON scalar.
pub fn json_to_scalar(value: &Value) -> Result<Scalar> {
    match value {
        Value::String(s) => Ok(Scalar::Text(s.clone())),
        Value::Bool(b) => Ok(Scalar::Boolean(*b)),
        Value::Number(n) => number_to_scalar(n),
        other => Err(BlueError::InvalidDocument(format!(
            "expected a scalar value, found {}",
            other
        ))),
    }
}

/// Numbers keep their exact literal text: integers of any size stay integers and decimals
/// keep every digit.
fn number_to_scalar(number: &Number) -> Result<Scalar> {
    let text = number.to_string();
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(integer) = BigInt::from_str(&text) {
            return Ok(Scalar::Integer(integer));
        }
    }
    BigDecimal::from_str(&text)
        .map(Scalar::Decimal)
        .map_err(|e| BlueError::InvalidDocument(format!("invalid number {}: {}", text, e)))
}

fn decimal_from_json(key: &str, value: &Value) -> Result<BigDecimal> {
    match json_to_scalar(value)? {
        Scalar::Integer(i) => Ok(BigDecimal::from(i)),
        Scalar::Decimal(d) => Ok(d),
        Scalar::Text(s) => BigDecimal::from_str(&s)
            .map_err(|_| BlueError::InvalidDocument(format!("{} must be a number", key))),
        Scalar::Boolean(_) => Err(BlueError::InvalidDocument(format!("{} must be a number", key))),
    }
}

fn usize_from_json(key: &str, value: &Value) -> Result<usize> {
    value
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| BlueError::InvalidDocument(format!("{} must be a non-negative integer", key)))
}

fn bool_from_json(key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| BlueError::InvalidDocument(format!("{} must be a boolean", key)))
}

/// Decode a `constraints` object.
pub fn constraints_from_json(value: &Value) -> Result<Constraints> {
    let map = value
        .as_object()
        .ok_or_else(|| BlueError::InvalidDocument("constraints must be an object".to_string()))?;

    let mut c = Constraints::new();
    for (key, value) in map {
        let k = key.as_str();
        match k {
            "required" => c.required = Some(bool_from_json(k, value)?),
            "allowMultiple" => c.allow_multiple = Some(bool_from_json(k, value)?),
            "uniqueItems" => c.unique_items = Some(bool_from_json(k, value)?),
            "minLength" => c.min_length = Some(usize_from_json(k, value)?),
            "maxLength" => c.max_length = Some(usize_from_json(k, value)?),
            "minItems" => c.min_items = Some(usize_from_json(k, value)?),
            "maxItems" => c.max_items = Some(usize_from_json(k, value)?),
            "minimum" => c.minimum = Some(decimal_from_json(k, value)?),
            "maximum" => c.maximum = Some(decimal_from_json(k, value)?),
            "exclusiveMinimum" => c.exclusive_minimum = Some(decimal_from_json(k, value)?),
            "exclusiveMaximum" => c.exclusive_maximum = Some(decimal_from_json(k, value)?),
            "multipleOf" => c.multiple_of = Some(decimal_from_json(k, value)?),
            "pattern" => match value {
                Value::String(p) => c.pattern.push(p.clone()),
                Value::Array(patterns) => {
                    for p in patterns {
                        c.pattern.push(expect_string(k, p)?);
                    }
                }
                _ => {
                    return Err(BlueError::InvalidDocument(
                        "pattern must be a string or an array of strings".to_string(),
                    ))
                }
            },
            "options" => match value {
                Value::Array(options) => c.options = Some(decode_items(options)?),
                _ => {
                    return Err(BlueError::InvalidDocument(
                        "options must be an array".to_string(),
                    ))
                }
            },
            other => {
                return Err(BlueError::InvalidDocument(format!(
                    "unknown constraint {}",
                    other
                )))
            }
        }
    }
    Ok(c)
}

// ----------------------------------------------------------------------------
// Encoding
// ----------------------------------------------------------------------------

/// Encode a node as a JSON document.
///
/// Nodes holding only a value or only items are written in their bare form. Numbers are
/// written with their exact digits.
pub fn node_to_json(node: &Node) -> Value {
    if node.inline_value {
        if let Some(value) = &node.value {
            return scalar_to_json(value);
        }
    }

    let only_value = node.value.is_some() && is_bare(node) && node.items.is_none();
    if only_value {
        if let Some(value) = &node.value {
            return scalar_to_json(value);
        }
    }
    let only_items = node.items.is_some() && is_bare(node) && node.value.is_none();
    if only_items {
        if let Some(items) = &node.items {
            return Value::Array(items.iter().map(node_to_json).collect());
        }
    }

    let mut map = Map::new();
    if let Some(name) = &node.name {
        map.insert(NAME.into(), Value::String(name.clone()));
    }
    if let Some(description) = &node.description {
        map.insert(DESCRIPTION.into(), Value::String(description.clone()));
    }
    let typed = [
        (TYPE, &node.node_type),
        (ITEM_TYPE, &node.item_type),
        (KEY_TYPE, &node.key_type),
        (VALUE_TYPE, &node.value_type),
    ];
    for (key, field) in typed {
        if let Some(t) = field {
            map.insert(key.into(), node_to_json(t));
        }
    }
    if let Some(value) = &node.value {
        map.insert(VALUE.into(), scalar_to_json(value));
    }
    if let Some(items) = &node.items {
        map.insert(ITEMS.into(), Value::Array(items.iter().map(node_to_json).collect()));
    }
    if let Some(blue_id) = &node.blue_id {
        map.insert(BLUE_ID.into(), Value::String(blue_id.clone()));
    }
    if let Some(constraints) = &node.constraints {
        map.insert(CONSTRAINTS.into(), constraints_to_json(constraints));
    }
    if let Some(properties) = &node.properties {
        for (key, value) in properties {
            map.insert(key.clone(), node_to_json(value));
        }
    }
    Value::Object(map)
}

fn is_bare(node: &Node) -> bool {
    node.name.is_none()
        && node.description.is_none()
        && node.node_type.is_none()
        && node.item_type.is_none()
        && node.key_type.is_none()
        && node.value_type.is_none()
        && node.properties.is_none()
        && node.blue_id.is_none()
        && node.constraints.is_none()
}

/// Encode a scalar as a JSON value.
pub fn scalar_to_json(value: &Scalar) -> Value {
    match value {
        Scalar::Text(s) => Value::String(s.clone()),
        Scalar::Boolean(b) => Value::Bool(*b),
        Scalar::Integer(i) => exact_number(i.to_string()),
        Scalar::Decimal(d) => exact_number(d.to_string()),
    }
}

fn exact_number(text: String) -> Value {
    match serde_json::from_str::<Number>(&text) {
        Ok(number) => Value::Number(number),
        Err(_) => Value::String(text),
    }
}

fn decimal_to_json(d: &BigDecimal) -> Value {
    scalar_to_json(&Scalar::Decimal(d.clone()))
}

/// Encode constraints, emitting only the rules that are set.
pub fn constraints_to_json(c: &Constraints) -> Value {
    let mut map = Map::new();
    let flags = [
        ("required", c.required),
        ("allowMultiple", c.allow_multiple),
        ("uniqueItems", c.unique_items),
    ];
    for (key, flag) in flags {
        if let Some(flag) = flag {
            map.insert(key.into(), Value::Bool(flag));
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
            map.insert(key.into(), Value::Number((count as u64).into()));
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
            map.insert(key.into(), decimal_to_json(bound));
        }
    }
    if !c.pattern.is_empty() {
        map.insert(
            "pattern".into(),
            Value::Array(c.pattern.iter().cloned().map(Value::String).collect()),
        );
    }
    if let Some(options) = &c.options {
        map.insert("options".into(), Value::Array(options.iter().map(node_to_json).collect()));
    }
    Value::Object(map)
}

// ----------------------------------------------------------------------------
// Serde integration
// ----------------------------------------------------------------------------

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        node_to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        node_from_json(&value).map_err(D::Error::custom)
    }
}
