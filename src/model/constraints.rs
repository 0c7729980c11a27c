//! Declarative validation rules attached to nodes.

use bigdecimal::BigDecimal;

use super::Node;

/// Validation rules carried in a node's `constraints` field.
///
/// All fields are optional. An empty `Constraints` (see [`Constraints::is_empty`]) behaves
/// exactly like an absent one and is dropped from the canonical form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    /// Value must be present
    pub required: Option<bool>,
    /// More than one value may be given
    pub allow_multiple: Option<bool>,
    /// Minimum text length in characters
    pub min_length: Option<usize>,
    /// Maximum text length in characters
    pub max_length: Option<usize>,
    /// Every pattern must match the whole value
    pub pattern: Vec<String>,
    /// Inclusive lower bound
    pub minimum: Option<BigDecimal>,
    /// Inclusive upper bound
    pub maximum: Option<BigDecimal>,
    /// Exclusive lower bound
    pub exclusive_minimum: Option<BigDecimal>,
    /// Exclusive upper bound
    pub exclusive_maximum: Option<BigDecimal>,
    /// Value must be an exact multiple
    pub multiple_of: Option<BigDecimal>,
    /// Fewest list items
    pub min_items: Option<usize>,
    /// Most list items
    pub max_items: Option<usize>,
    /// List items must have distinct blueIds
    pub unique_items: Option<bool>,
    /// Allowed values, compared by blueId
    pub options: Option<Vec<Node>>,
}

impl Constraints {
    /// Create an empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no rule is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set `required`.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Set `allow_multiple`.
    pub fn with_allow_multiple(mut self, allow: bool) -> Self {
        self.allow_multiple = Some(allow);
        self
    }

    /// Set `min_length`.
    pub fn with_min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    /// Set `max_length`.
    pub fn with_max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Add a pattern; all patterns must match.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern.push(pattern.into());
        self
    }

    /// Set `minimum`.
    pub fn with_minimum(mut self, value: BigDecimal) -> Self {
        self.minimum = Some(value);
        self
    }

    /// Set `maximum`.
    pub fn with_maximum(mut self, value: BigDecimal) -> Self {
        self.maximum = Some(value);
        self
    }

    /// Set `exclusive_minimum`.
    pub fn with_exclusive_minimum(mut self, value: BigDecimal) -> Self {
        self.exclusive_minimum = Some(value);
        self
    }

    /// Set `exclusive_maximum`.
    pub fn with_exclusive_maximum(mut self, value: BigDecimal) -> Self {
        self.exclusive_maximum = Some(value);
        self
    }

    /// Set `multiple_of`.
    pub fn with_multiple_of(mut self, value: BigDecimal) -> Self {
        self.multiple_of = Some(value);
        self
    }

    /// Set `min_items`.
    pub fn with_min_items(mut self, count: usize) -> Self {
        self.min_items = Some(count);
        self
    }

    /// Set `max_items`.
    pub fn with_max_items(mut self, count: usize) -> Self {
        self.max_items = Some(count);
        self
    }

    /// Set `unique_items`.
    pub fn with_unique_items(mut self, unique: bool) -> Self {
        self.unique_items = Some(unique);
        self
    }

    /// Set `options`.
    pub fn with_options(mut self, options: Vec<Node>) -> Self {
        self.options = Some(options);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(Constraints::new().is_empty());
        assert!(!Constraints::new().with_min_length(1).is_empty());
        assert!(!Constraints::new().with_pattern("a.*").is_empty());
    }
}
