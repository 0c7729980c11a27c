//! Content providers: resolving a blueId to stored nodes.
//!
//! A provider returns zero, one or many candidates for an id:
//!
//! | Candidates | Meaning |
//! |------------|---------|
//! | none | unknown id |
//! | one | the normal case |
//! | several | the id names an ordered list of sibling documents, each addressable as `id#index` |
//!
//! The core takes ownership of whatever a provider returns and may mutate it, so providers
//! hand out clones and never references into their own storage.
//!
//! # Module Organization
//!
//! ```text
//! provider/
//! ├── mod.rs        - NodeProvider trait, SequentialProvider
//! ├── bootstrap.rs  - built-in basic type definitions
//! ├── memory.rs     - in-memory registry with sibling lists and self-references
//! └── caching.rs    - LRU cache around another provider
//! ```

pub mod bootstrap;
pub mod caching;
pub mod memory;

use std::sync::Arc;

pub use bootstrap::BootstrapProvider;
pub use caching::CachingProvider;
pub use memory::InMemoryProvider;

use crate::error::{BlueError, Result};
use crate::model::Node;

/// Source of stored content, keyed by blueId.
pub trait NodeProvider: Send + Sync {
    /// All candidates stored under `blue_id`; empty when unknown.
    fn fetch_by_blue_id(&self, blue_id: &str) -> Vec<Node>;

    /// The first candidate, if any.
    fn fetch_first(&self, blue_id: &str) -> Option<Node> {
        self.fetch_by_blue_id(blue_id).into_iter().next()
    }
}

impl<F> NodeProvider for F
where
    F: Fn(&str) -> Vec<Node> + Send + Sync,
{
    fn fetch_by_blue_id(&self, blue_id: &str) -> Vec<Node> {
        self(blue_id)
    }
}

/// Fetch an id that must name at most one document.
///
/// Returns `Ok(None)` for unknown ids and [`BlueError::AmbiguousContent`] when the id names
/// a list of documents.
pub fn fetch_single(provider: &dyn NodeProvider, blue_id: &str) -> Result<Option<Node>> {
    let mut candidates = provider.fetch_by_blue_id(blue_id);
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        count => Err(BlueError::AmbiguousContent {
            blue_id: blue_id.to_string(),
            count,
        }),
    }
}

/// Asks each provider in turn and returns the first non-empty answer.
#[derive(Clone, Default)]
pub struct SequentialProvider {
    providers: Vec<Arc<dyn NodeProvider>>,
}

impl SequentialProvider {
    /// Consult `providers` in order.
    pub fn new(providers: Vec<Arc<dyn NodeProvider>>) -> Self {
        Self { providers }
    }

    /// Append a provider with the lowest priority.
    pub fn push(&mut self, provider: Arc<dyn NodeProvider>) {
        self.providers.push(provider);
    }

    /// Number of providers in the stack.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the stack has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl NodeProvider for SequentialProvider {
    fn fetch_by_blue_id(&self, blue_id: &str) -> Vec<Node> {
        self.providers
            .iter()
            .map(|p| p.fetch_by_blue_id(blue_id))
            .find(|nodes| !nodes.is_empty())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(id: &'static str, name: &'static str) -> Arc<dyn NodeProvider> {
        Arc::new(move |requested: &str| {
            if requested == id {
                vec![Node::new().with_name(name)]
            } else {
                Vec::new()
            }
        })
    }

    #[test]
    fn test_closure_provider() {
        let provider = |id: &str| vec![Node::new().with_name(id)];
        assert_eq!(provider.fetch_first("x").unwrap().name.as_deref(), Some("x"));
    }

    #[test]
    fn test_sequential_first_non_empty_wins() {
        let seq = SequentialProvider::new(vec![fixed("a", "first"), fixed("a", "second"), fixed("b", "b")]);
        assert_eq!(seq.fetch_first("a").unwrap().name.as_deref(), Some("first"));
        assert_eq!(seq.fetch_first("b").unwrap().name.as_deref(), Some("b"));
        assert!(seq.fetch_by_blue_id("c").is_empty());
    }

    #[test]
    fn test_fetch_single_rejects_lists() {
        let provider = |_: &str| vec![Node::new(), Node::new()];
        let err = fetch_single(&provider, "x").unwrap_err();
        assert!(matches!(err, BlueError::AmbiguousContent { count: 2, .. }));

        let empty = |_: &str| Vec::<Node>::new();
        assert!(fetch_single(&empty, "x").unwrap().is_none());
    }
}
