//! The `Blue` facade and its configuration.
//!
//! [`Blue`] bundles a provider stack, a merge pipeline and a [`BlueConfig`], and is the
//! usual entry point:
//!
//! ```
//! use std::sync::Arc;
//! use blue_language::{Blue, Limits};
//! use blue_language::provider::InMemoryProvider;
//! use serde_json::json;
//!
//! let registry = Arc::new(InMemoryProvider::new());
//! let blue = Blue::new(registry.clone());
//!
//! let person = blue.node_from_json(&json!({"name": "Person", "age": {"type": "Integer"}})).unwrap();
//! let person_id = registry.add(person).unwrap();
//!
//! let alice = blue.node_from_json(&json!({"type": {"blueId": person_id}, "age": 30})).unwrap();
//! let resolved = blue.resolve(&alice, Limits::Unbounded).unwrap();
//! assert_eq!(resolved.get("/age").unwrap().value.as_ref().unwrap().to_string(), "30");
//! ```
//!
//! Lookups go to the built-in basic types first, then to the caller's provider (behind an
//! LRU cache when `cache_capacity` is set).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::blue_id;
use crate::error::Result;
use crate::extend::{MissingContentStrategy, NodeExtender};
use crate::limits::Limits;
use crate::merge::merger::DEFAULT_MAX_NESTING;
use crate::merge::{Merger, Pipeline};
use crate::model::Node;
use crate::preprocess::Preprocessor;
use crate::protocol;
use crate::provider::{BootstrapProvider, CachingProvider, NodeProvider, SequentialProvider};
use crate::reverse::MergeReverser;
use crate::typing::{self, DEFAULT_MAX_TYPE_CHAIN_DEPTH};

// ========== Configuration ==========

/// Settings for a [`Blue`] instance.
///
/// Missing fields take their defaults when deserialized:
///
/// ```
/// use blue_language::{BlueConfig, MissingContentStrategy};
///
/// let config = BlueConfig::from_json(r#"{"missing_content": "skip", "cache_capacity": 500}"#).unwrap();
/// assert_eq!(config.missing_content, MissingContentStrategy::Skip);
/// assert_eq!(config.max_type_chain_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueConfig {
    /// Handling of stubs whose content cannot be found
    pub missing_content: MissingContentStrategy,
    /// Longest type chain walked before it is reported as cyclic
    pub max_type_chain_depth: usize,
    /// Deepest nesting of resolve and extend calls
    pub max_nesting_depth: usize,
    /// Replace inline type names and infer basic types on input
    pub preprocess: bool,
    /// Cache this many documents from the caller's provider
    pub cache_capacity: Option<usize>,
}

impl Default for BlueConfig {
    fn default() -> Self {
        Self {
            missing_content: MissingContentStrategy::Fail,
            max_type_chain_depth: DEFAULT_MAX_TYPE_CHAIN_DEPTH,
            max_nesting_depth: DEFAULT_MAX_NESTING,
            preprocess: true,
            cache_capacity: None,
        }
    }
}

impl BlueConfig {
    /// Load a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the handling of unresolvable stubs.
    pub fn with_missing_content(mut self, strategy: MissingContentStrategy) -> Self {
        self.missing_content = strategy;
        self
    }

    /// Set the longest type chain walked.
    pub fn with_max_type_chain_depth(mut self, depth: usize) -> Self {
        self.max_type_chain_depth = depth;
        self
    }

    /// Set the deepest nesting of resolve and extend calls.
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Turn input preprocessing on or off.
    pub fn with_preprocess(mut self, enabled: bool) -> Self {
        self.preprocess = enabled;
        self
    }

    /// Put an LRU cache of `capacity` documents in front of the caller's provider.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }
}

// ========== Facade ==========

/// Entry point bundling a provider stack, a pipeline and configuration.
pub struct Blue {
    provider: Arc<dyn NodeProvider>,
    config: BlueConfig,
    pipeline: Pipeline,
    preprocessor: Preprocessor,
}

impl Blue {
    /// Create an instance over `provider` with the default configuration.
    pub fn new(provider: Arc<dyn NodeProvider>) -> Self {
        Self::with_config(provider, BlueConfig::default())
    }

    /// Create an instance over `provider` with `config`.
    ///
    /// The basic types are always consulted before `provider`.
    pub fn with_config(provider: Arc<dyn NodeProvider>, config: BlueConfig) -> Self {
        let user: Arc<dyn NodeProvider> = match config.cache_capacity {
            Some(capacity) => {
                debug!(capacity, "caching provider enabled");
                Arc::new(CachingProvider::new(SequentialProvider::new(vec![provider]), capacity))
            }
            None => provider,
        };
        let bootstrap: Arc<dyn NodeProvider> = Arc::new(BootstrapProvider::new());
        let stack = SequentialProvider::new(vec![bootstrap, user]);
        Self {
            provider: Arc::new(stack),
            config,
            pipeline: Pipeline::default(),
            preprocessor: Preprocessor::default(),
        }
    }

    /// Replace the merge pipeline.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Replace the preprocessor, e.g. to register type aliases.
    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &BlueConfig {
        &self.config
    }

    /// The full provider stack, basic types included.
    pub fn provider(&self) -> &dyn NodeProvider {
        &*self.provider
    }

    // ========== Operations ==========

    /// Decode a JSON document, preprocessing it when enabled.
    pub fn node_from_json(&self, json: &Value) -> Result<Node> {
        Ok(self.preprocess(protocol::node_from_json(json)?))
    }

    /// Apply the configured preprocessing; a no-op when disabled.
    pub fn preprocess(&self, node: Node) -> Node {
        if self.config.preprocess {
            self.preprocessor.process(node)
        } else {
            node
        }
    }

    /// Resolve `node` against its type chain within `limits`.
    pub fn resolve(&self, node: &Node, mut limits: Limits) -> Result<Node> {
        let node = self.preprocess(node.clone());
        self.merger().resolve(&node, &mut limits)
    }

    /// Replace stubs in `node` with provider content within `limits`.
    pub fn extend(&self, node: &mut Node, mut limits: Limits) -> Result<()> {
        NodeExtender::new(self.provider())
            .with_strategy(self.config.missing_content)
            .with_max_type_chain_depth(self.config.max_type_chain_depth)
            .with_max_nesting(self.config.max_nesting_depth)
            .extend(node, &mut limits)
    }

    /// BlueId of `node` after preprocessing.
    pub fn calculate_blue_id(&self, node: &Node) -> String {
        blue_id::calculate_blue_id(&self.preprocess(node.clone()))
    }

    /// Whether `subtype` reaches `supertype` along its type chain.
    pub fn is_subtype(&self, subtype: &Node, supertype: &Node) -> Result<bool> {
        typing::is_subtype_within(
            subtype,
            supertype,
            self.provider(),
            self.config.max_type_chain_depth,
        )
    }

    /// Minimal form of a resolved node.
    pub fn reverse(&self, resolved: &Node) -> Node {
        MergeReverser.reverse(resolved)
    }

    fn merger(&self) -> Merger<'_> {
        Merger::new(&self.pipeline, self.provider())
            .with_strategy(self.config.missing_content)
            .with_max_type_chain_depth(self.config.max_type_chain_depth)
            .with_max_nesting(self.config.max_nesting_depth)
    }
}
