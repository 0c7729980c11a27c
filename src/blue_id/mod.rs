//! Content identifiers.
//!
//! A blueId is `Base58(SHA-256(canonical JSON))`, computed recursively:
//!
//! | Input | Hash |
//! |-------|------|
//! | map with `blueId` | that id, unchanged |
//! | other map | entries pre-hashed to `{"blueId": ...}` except `name`, `value`, `ref` |
//! | list of one | the element's hash |
//! | longer list | left fold over `[{"blueId": prefix}, {"blueId": last}]` |
//! | scalar | hash of its text form as a JSON string |
//!
//! Replacing any subtree with a stub carrying that subtree's id leaves every enclosing id
//! unchanged.

pub mod base58;
pub mod calculator;
pub mod canonical;

pub use calculator::{
    calculate_blue_id, calculate_blue_id_for_list, hash_json, hash_value, is_potential_blue_id,
};
pub use canonical::Canonical;
