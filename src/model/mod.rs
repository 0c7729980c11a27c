//! Node data model.
//!
//! - [`Node`] - the tree value
//! - [`Scalar`] - leaf values (text, integer, decimal, boolean)
//! - [`Constraints`] - validation rules carried by a node

pub mod constraints;
pub mod node;
pub mod scalar;

pub use constraints::Constraints;
pub use node::Node;
pub use scalar::Scalar;
