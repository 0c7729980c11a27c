//! Document protocol: well-known ids, reserved keys and JSON encoding.

pub mod constants;
pub mod encoding;

pub use encoding::{constraints_from_json, node_from_json, node_to_json};
