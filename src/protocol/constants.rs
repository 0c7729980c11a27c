//! Well-known identifiers and reserved document keys.

/// BlueId of the built-in `Text` type.
pub const TEXT_TYPE_BLUE_ID: &str = "F92yo19rCcbBoBSpUA5LRxpfDejJDAaP1PRxxbWAraVP";
/// BlueId of the built-in `Double` type.
pub const DOUBLE_TYPE_BLUE_ID: &str = "68ryJtnmui4j5rCZWUULgWFbgD8ujKCX8tfAzjwpmKoD";
/// BlueId of the built-in `Integer` type.
pub const INTEGER_TYPE_BLUE_ID: &str = "DHmxTkFaXvkMbfUFXzJz3bDb2kPAjWM6gaC7mGAJEn8u";
/// BlueId of the built-in `Boolean` type.
pub const BOOLEAN_TYPE_BLUE_ID: &str = "EL6AjrbJsxTWRTPzY8WR8Y2zAMXRbydQj83PcZwuAHbo";
/// BlueId of the built-in `List` type.
pub const LIST_TYPE_BLUE_ID: &str = "G8wmfjEqugPEEXByMYWJXiEdbLToPRWNQEekNxrxfQWB";
/// BlueId of the built-in `Dictionary` type.
pub const DICTIONARY_TYPE_BLUE_ID: &str = "294NBTj2mFRL3RB4kDRUSckwGg7Kzj6T8CTAFeR1kcSA";

/// Name of the built-in `Text` type.
pub const TEXT_TYPE: &str = "Text";
/// Name of the built-in `Double` type.
pub const DOUBLE_TYPE: &str = "Double";
/// Name of the built-in `Integer` type.
pub const INTEGER_TYPE: &str = "Integer";
/// Name of the built-in `Boolean` type.
pub const BOOLEAN_TYPE: &str = "Boolean";
/// Name of the built-in `List` type.
pub const LIST_TYPE: &str = "List";
/// Name of the built-in `Dictionary` type.
pub const DICTIONARY_TYPE: &str = "Dictionary";

/// The six built-in types as `(name, blueId)` pairs.
pub const BASIC_TYPES: [(&str, &str); 6] = [
    (TEXT_TYPE, TEXT_TYPE_BLUE_ID),
    (DOUBLE_TYPE, DOUBLE_TYPE_BLUE_ID),
    (INTEGER_TYPE, INTEGER_TYPE_BLUE_ID),
    (BOOLEAN_TYPE, BOOLEAN_TYPE_BLUE_ID),
    (LIST_TYPE, LIST_TYPE_BLUE_ID),
    (DICTIONARY_TYPE, DICTIONARY_TYPE_BLUE_ID),
];

// Reserved document keys
/// Reserved key `name`.
pub const NAME: &str = "name";
/// Reserved key `description`.
pub const DESCRIPTION: &str = "description";
/// Reserved key `type`.
pub const TYPE: &str = "type";
/// Reserved key `itemType`.
pub const ITEM_TYPE: &str = "itemType";
/// Reserved key `keyType`.
pub const KEY_TYPE: &str = "keyType";
/// Reserved key `valueType`.
pub const VALUE_TYPE: &str = "valueType";
/// Reserved key `value`.
pub const VALUE: &str = "value";
/// Reserved key `items`.
pub const ITEMS: &str = "items";
/// Reserved key `blueId`.
pub const BLUE_ID: &str = "blueId";
/// Reserved key `constraints`.
pub const CONSTRAINTS: &str = "constraints";

/// Keys passed through verbatim when a map is hashed.
pub const HASH_PASSTHROUGH_KEYS: [&str; 3] = [NAME, VALUE, "ref"];

/// Self-reference marker used inside documents registered with a provider.
pub const THIS_REFERENCE: &str = "this";

/// Largest integer that is emitted as a JSON number in canonical form.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Look up a basic type's blueId by name.
pub fn basic_type_blue_id(name: &str) -> Option<&'static str> {
    BASIC_TYPES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, id)| *id)
}

/// Look up a basic type's name by blueId.
pub fn basic_type_name(blue_id: &str) -> Option<&'static str> {
    BASIC_TYPES
        .iter()
        .find(|(_, id)| *id == blue_id)
        .map(|(n, _)| *n)
}
