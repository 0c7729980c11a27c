//! Error types for resolution, extension and hashing.
//!
//! Every failure in this crate is synchronous and aborts the operation that raised it.
//! Nothing is retried internally; callers decide whether to report, retry or give up.
//!
//! # Taxonomy
//!
//! | Kind | Variants |
//! |------|----------|
//! | Structural conflicts | [`BlueError::Structure`], [`BlueError::ValueConflict`], [`BlueError::ListShrink`], [`BlueError::ItemMismatch`] |
//! | Type errors | [`BlueError::TypeMismatch`], [`BlueError::CyclicTypeChain`] |
//! | Constraint violations | [`BlueError::ConstraintViolation`] |
//! | Missing content | [`BlueError::MissingContent`], [`BlueError::AmbiguousContent`] |
//! | Input errors | [`BlueError::InvalidPath`], [`BlueError::InvalidDocument`], [`BlueError::Json`], [`BlueError::Regex`] |

use thiserror::Error;

/// Result type alias for Blue operations.
pub type Result<T> = std::result::Result<T, BlueError>;

/// Errors raised while hashing, extending or resolving nodes.
#[derive(Error, Debug)]
pub enum BlueError {
    /// Mutually exclusive fields set together, or an otherwise malformed tree.
    #[error("Structural conflict: {0}")]
    Structure(String),

    /// The source's type is not a subtype of the accumulator's type.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Accumulator and source carry different values.
    #[error("Value conflict: source value {source_value} differs from existing value {existing}")]
    ValueConflict {
        /// The value already present in the accumulator
        existing: String,
        /// The conflicting value from the source
        source_value: String,
    },

    /// The source has fewer items than the list it refines.
    #[error("List shrink: source has {source_len} items but the inherited list has {existing_len}")]
    ListShrink {
        /// Items inherited from the type
        existing_len: usize,
        /// Items supplied by the source
        source_len: usize,
    },

    /// A fixed list position differs between the type and the source.
    #[error("Item mismatch at index {index}: expected {expected}, found {found}")]
    ItemMismatch {
        /// Position in the list
        index: usize,
        /// BlueId of the inherited item
        expected: String,
        /// BlueId of the source item
        found: String,
    },

    /// A single constraint failed.
    #[error("Constraint {constraint} violated: {message}")]
    ConstraintViolation {
        /// Constraint keyword, e.g. `minLength`
        constraint: &'static str,
        /// The offending value or measurement
        value: String,
        /// The configured limit
        limit: String,
        /// Human-readable description
        message: String,
    },

    /// A stub could not be dereferenced.
    #[error("No content found for blueId {0}")]
    MissingContent(String),

    /// More than one candidate was returned where exactly one is required.
    #[error("Ambiguous content for blueId {blue_id}: {count} candidates")]
    AmbiguousContent {
        /// The requested id
        blue_id: String,
        /// Number of candidates returned by the provider
        count: usize,
    },

    /// A type chain refers back to itself or exceeds the configured depth.
    #[error("Cyclic or too deep type chain at {blue_id} (depth {depth})")]
    CyclicTypeChain {
        /// The id at which the walk stopped
        blue_id: String,
        /// Chain length when the walk stopped
        depth: usize,
    },

    /// A scope path pattern could not be parsed.
    #[error("Invalid path pattern: {0}")]
    InvalidPath(String),

    /// A document could not be decoded into a node.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// JSON serialization or parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A `pattern` constraint is not a valid regular expression.
    #[error("Invalid regex: {0}")]
    Regex(#[from] regex::Error),
}

impl BlueError {
    /// Convenience constructor for constraint failures.
    pub(crate) fn constraint(
        constraint: &'static str,
        value: impl ToString,
        limit: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        BlueError::ConstraintViolation {
            constraint,
            value: value.to_string(),
            limit: limit.to_string(),
            message: message.into(),
        }
    }

    /// Check if this error is a structural conflict.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            BlueError::Structure(_)
                | BlueError::ValueConflict { .. }
                | BlueError::ListShrink { .. }
                | BlueError::ItemMismatch { .. }
        )
    }

    /// Check if this error is a type error.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            BlueError::TypeMismatch(_) | BlueError::CyclicTypeChain { .. }
        )
    }

    /// Check if this error is a constraint violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, BlueError::ConstraintViolation { .. })
    }

    /// Check if this error means referenced content was unavailable.
    pub fn is_missing_content(&self) -> bool {
        matches!(
            self,
            BlueError::MissingContent(_) | BlueError::AmbiguousContent { .. }
        )
    }
}
