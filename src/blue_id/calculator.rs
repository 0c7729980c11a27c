//! Content hashing over canonical forms.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::base58;
use super::canonical::{self, Canonical};
use crate::model::Node;
use crate::protocol::constants::{BLUE_ID, HASH_PASSTHROUGH_KEYS};

/// Compute the blueId of a node.
///
/// A node that carries a `blue_id` hashes to that id without looking at its other fields.
/// A node with no content hashes as the empty map `{}`.
///
/// # Examples
///
/// ```
/// use blue_language::blue_id::calculate_blue_id;
/// use blue_language::model::Node;
///
/// let node = Node::new().with_name("Alice").with_property("age", Node::new().with_value(30));
/// assert_eq!(calculate_blue_id(&node), calculate_blue_id(&node.clone()));
/// assert_eq!(calculate_blue_id(&Node::stub("abc").with_value(1)), "abc");
/// ```
pub fn calculate_blue_id(node: &Node) -> String {
    match canonical::from_node(node) {
        Some(c) => hash_value(&c),
        None => hash_json(&Canonical::Map(BTreeMap::new())),
    }
}

/// Compute the blueId of a list of sibling documents.
pub fn calculate_blue_id_for_list(nodes: &[Node]) -> String {
    match canonical::from_nodes(nodes) {
        Some(c) => hash_value(&c),
        None => hash_json(&Canonical::List(Vec::new())),
    }
}

/// Hash an already-canonical value.
pub fn hash_value(value: &Canonical) -> String {
    match value {
        Canonical::Map(map) => hash_map(map),
        Canonical::List(list) => hash_list(list),
        Canonical::Text(s) => hash_json(&Canonical::Text(s.clone())),
        Canonical::Integer(i) => hash_json(&Canonical::Text(i.to_string())),
        Canonical::Decimal(d) => hash_json(&Canonical::Text(d.to_string())),
        Canonical::Boolean(b) => hash_json(&Canonical::Text(b.to_string())),
    }
}

fn hash_map(map: &BTreeMap<String, Canonical>) -> String {
    if let Some(Canonical::Text(blue_id)) = map.get(BLUE_ID) {
        return blue_id.clone();
    }

    let hashed = map
        .iter()
        .map(|(key, value)| {
            let entry = if HASH_PASSTHROUGH_KEYS.contains(&key.as_str()) {
                value.clone()
            } else {
                Canonical::blue_id_ref(hash_value(value))
            };
            (key.clone(), entry)
        })
        .collect();

    hash_json(&Canonical::Map(hashed))
}

/// Left fold: `h(l) = H([{blueId: h(l[..n-1])}, {blueId: h(l[n-1])}])`.
fn hash_list(list: &[Canonical]) -> String {
    let Some((first, rest)) = list.split_first() else {
        return hash_json(&Canonical::List(Vec::new()));
    };

    let mut acc = hash_value(first);
    for item in rest {
        let pair = vec![
            Canonical::blue_id_ref(acc),
            Canonical::blue_id_ref(hash_value(item)),
        ];
        acc = hash_json(&Canonical::List(pair));
    }
    acc
}

/// SHA-256 over the canonical JSON bytes, Base58-encoded.
pub fn hash_json(value: &Canonical) -> String {
    let digest = Sha256::digest(value.to_json().as_bytes());
    base58::encode(&digest)
}

/// True if `value` looks like a blueId: valid Base58 of a 32-byte digest, with an optional
/// `#index` suffix.
pub fn is_potential_blue_id(value: &str) -> bool {
    let (id, index) = match value.split_once('#') {
        Some((id, index)) => (id, Some(index)),
        None => (value, None),
    };
    if let Some(index) = index {
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    if !(32..=44).contains(&id.len()) {
        return false;
    }
    base58::decode(id).is_some_and(|bytes| bytes.len() == 32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scalar;
    use proptest::prelude::*;

    fn leaf(v: i64) -> Node {
        Node::new().with_value(v)
    }

    #[test]
    fn test_stub_transparency() {
        let node = Node::stub("X").with_name("ignored").with_property("p", leaf(1));
        assert_eq!(calculate_blue_id(&node), "X");
    }

    #[test]
    fn test_single_item_list_is_transparent() {
        let x = leaf(7);
        assert_eq!(calculate_blue_id_for_list(&[x.clone()]), calculate_blue_id(&x));
        let wrapped = Node::new().with_items(vec![x.clone()]);
        let direct = Node::new().with_items(vec![x.clone(), x.clone()]);
        assert_ne!(calculate_blue_id(&wrapped), calculate_blue_id(&direct));
    }

    #[test]
    fn test_list_fold_law() {
        let list = vec![leaf(1), leaf(2), leaf(3)];
        let prefix = calculate_blue_id_for_list(&list[..2]);
        let last = calculate_blue_id(&list[2]);
        let expected = hash_json(&Canonical::List(vec![
            Canonical::blue_id_ref(prefix),
            Canonical::blue_id_ref(last),
        ]));
        assert_eq!(calculate_blue_id_for_list(&list), expected);
    }

    #[test]
    fn test_stub_substitution_preserves_id() {
        let child = Node::new().with_name("child").with_property("x", leaf(1));
        let child_id = calculate_blue_id(&child);
        let full = Node::new().with_property("c", child);
        let by_ref = Node::new().with_property("c", Node::stub(child_id));
        assert_eq!(calculate_blue_id(&full), calculate_blue_id(&by_ref));
    }

    #[test]
    fn test_explicit_basic_type_equals_inferred() {
        use crate::protocol::constants::TEXT_TYPE_BLUE_ID;
        let inferred = Node::new().with_value("abc");
        let explicit = Node::new()
            .with_value("abc")
            .with_type(Node::stub(TEXT_TYPE_BLUE_ID));
        assert_eq!(calculate_blue_id(&inferred), calculate_blue_id(&explicit));
    }

    #[test]
    fn test_value_kind_matters() {
        let text = Node::new().with_value("1");
        let int = Node::new().with_value(1);
        assert_ne!(calculate_blue_id(&text), calculate_blue_id(&int));
    }

    #[test]
    fn test_potential_blue_id() {
        let id = calculate_blue_id(&leaf(1));
        assert!(is_potential_blue_id(&id));
        assert!(is_potential_blue_id(&format!("{}#3", id)));
        assert!(!is_potential_blue_id(&format!("{}#x", id)));
        assert!(!is_potential_blue_id("Text"));
    }

    #[test]
    fn test_empty_node_hash_is_stable() {
        assert_eq!(calculate_blue_id(&Node::new()), calculate_blue_id(&Node::new()));
        assert_eq!(
            calculate_blue_id(&Node::new()),
            hash_json(&Canonical::Map(BTreeMap::new()))
        );
    }

    fn arb_node() -> impl Strategy<Value = Node> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(|v| Node::new().with_value(v)),
            "[a-z]{0,8}".prop_map(|s| Node::new().with_value(Scalar::Text(s))),
            any::<bool>().prop_map(|b| Node::new().with_value(b)),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 1..4)
                    .prop_map(|items| Node::new().with_items(items)),
                proptest::collection::btree_map("[a-z]{1,4}", inner, 1..4).prop_map(|props| {
                    let mut node = Node::new();
                    node.properties = Some(props);
                    node
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_hash_is_deterministic_and_clone_stable(node in arb_node()) {
            let first = calculate_blue_id(&node);
            prop_assert_eq!(&first, &calculate_blue_id(&node));
            prop_assert_eq!(&first, &calculate_blue_id(&node.clone()));
        }
    }
}
