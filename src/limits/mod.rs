//! Resolution scopes ("limits").
//!
//! A [`Limits`] value answers one question during a tree walk: may the traversal descend
//! from the current position into child segment `S` (a property name or an item index)?
//! It tracks the current position itself, through [`Limits::enter`], which returns a
//! [`ScopeGuard`] that leaves the segment again when dropped. Exits are therefore paired
//! with enters on every path, including early returns through `?`.
//!
//! # Variants
//!
//! | Variant | Descends |
//! |---------|----------|
//! | [`Limits::Unbounded`] | always |
//! | [`Limits::End`] | never |
//! | [`Limits::Depth`] | while fewer than `max` segments have been entered |
//! | [`Limits::Path`] | while the position matches one of the patterns (and the optional depth cap) |
//! | [`Limits::Composite`] | only when every member would |
//!
//! # Combining scopes
//!
//! [`Limits::and`] combines independently requested views and **widens**:
//!
//! - `Depth(a).and(Depth(b))` is `Depth(max(a, b))`, not the minimum;
//! - `Path(p).and(Path(q))` allows anything either pattern allows;
//! - `Path(p).and(Depth(n))` is the paths capped at depth `n`;
//! - `Unbounded` and `End` are neutral and return the other side.
//!
//! For intersection semantics build a [`Limits::Composite`] explicitly.
//!
//! # Examples
//!
//! ```
//! use blue_language::limits::Limits;
//!
//! let mut limits = Limits::path("/a/a1").unwrap();
//! assert!(limits.should_descend("a"));
//! assert!(!limits.should_descend("b"));
//! {
//!     let inner = limits.enter("a");
//!     assert!(inner.should_descend("a1"));
//!     assert!(!inner.should_descend("a2"));
//! }
//! assert!(limits.should_descend("a"));
//! ```

pub mod path;

use std::ops::{Deref, DerefMut};

pub use path::{PathPattern, PathSegment};

use crate::error::Result;

/// Depth-bounded scope state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthLimits {
    max: usize,
    current: usize,
}

impl DepthLimits {
    /// Allow `max` levels below the root.
    pub fn new(max: usize) -> Self {
        Self { max, current: 0 }
    }

    /// The depth bound.
    pub fn max(&self) -> usize {
        self.max
    }
}

/// Path-pattern scope state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLimits {
    patterns: Vec<PathPattern>,
    max_depth: Option<usize>,
    stack: Vec<String>,
}

impl PathLimits {
    /// Allow any path matched by one of `patterns`.
    pub fn new(patterns: Vec<PathPattern>) -> Self {
        Self {
            patterns,
            max_depth: None,
            stack: Vec::new(),
        }
    }

    /// Stop at `max_depth` even inside a matching path.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// The patterns, in the order given.
    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    fn allows(&self, segment: &str) -> bool {
        if self.max_depth.is_some_and(|max| self.stack.len() >= max) {
            return false;
        }
        self.patterns.iter().any(|p| p.allows(&self.stack, segment))
    }
}

/// A traversal scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Limits {
    /// No restriction.
    Unbounded,
    /// Stop at the current node.
    End,
    /// At most this many levels
    Depth(DepthLimits),
    /// Only matching paths
    Path(PathLimits),
    /// Every member must allow a step.
    Composite(Vec<Limits>),
}

impl Default for Limits {
    fn default() -> Self {
        Limits::Unbounded
    }
}

impl Limits {
    // ========== Constructors ==========

    /// Descend at most `max` levels below the starting node.
    pub fn depth(max: usize) -> Self {
        Limits::Depth(DepthLimits::new(max))
    }

    /// Descend along one path pattern.
    pub fn path(pattern: &str) -> Result<Self> {
        Ok(Limits::Path(PathLimits::new(vec![PathPattern::parse(pattern)?])))
    }

    /// Descend along any of several path patterns.
    pub fn paths<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = patterns
            .into_iter()
            .map(|p| PathPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Limits::Path(PathLimits::new(parsed)))
    }

    /// The root node only; nothing below it.
    pub fn root_only() -> Self {
        Limits::Path(PathLimits::new(vec![PathPattern::root()]))
    }

    /// Conjunction: descend only where every member descends.
    pub fn composite(members: Vec<Limits>) -> Self {
        Limits::Composite(members)
    }

    // ========== Traversal ==========

    /// Whether the traversal may enter `segment` from the current position.
    pub fn should_descend(&self, segment: &str) -> bool {
        match self {
            Limits::Unbounded => true,
            Limits::End => false,
            Limits::Depth(d) => d.current < d.max,
            Limits::Path(p) => p.allows(segment),
            Limits::Composite(members) => members.iter().all(|m| m.should_descend(segment)),
        }
    }

    /// Whether an item at `index` may be entered.
    pub fn should_descend_index(&self, index: usize) -> bool {
        self.should_descend(&index.to_string())
    }

    /// Enter `segment`; the returned guard leaves it again on drop.
    pub fn enter(&mut self, segment: &str) -> ScopeGuard<'_> {
        self.push(segment);
        ScopeGuard { limits: self }
    }

    fn push(&mut self, segment: &str) {
        match self {
            Limits::Unbounded | Limits::End => {}
            Limits::Depth(d) => d.current += 1,
            Limits::Path(p) => p.stack.push(segment.to_string()),
            Limits::Composite(members) => members.iter_mut().for_each(|m| m.push(segment)),
        }
    }

    fn pop(&mut self) {
        match self {
            Limits::Unbounded | Limits::End => {}
            Limits::Depth(d) => d.current = d.current.saturating_sub(1),
            Limits::Path(p) => {
                p.stack.pop();
            }
            Limits::Composite(members) => members.iter_mut().for_each(Limits::pop),
        }
    }

    /// Current traversal depth below the starting node, where tracked.
    pub fn current_depth(&self) -> Option<usize> {
        match self {
            Limits::Unbounded | Limits::End => None,
            Limits::Depth(d) => Some(d.current),
            Limits::Path(p) => Some(p.stack.len()),
            Limits::Composite(members) => members.iter().find_map(Limits::current_depth),
        }
    }

    // ========== Combination ==========

    /// Combine two independently requested scopes. Widens; see the module docs.
    pub fn and(self, other: Limits) -> Limits {
        match (self, other) {
            (Limits::Unbounded | Limits::End, other) => other,
            (this, Limits::Unbounded | Limits::End) => this,
            (Limits::Depth(a), Limits::Depth(b)) => Limits::depth(a.max.max(b.max)),
            (Limits::Path(mut a), Limits::Path(b)) => {
                a.patterns.extend(b.patterns);
                a.max_depth = match (a.max_depth, b.max_depth) {
                    (Some(x), Some(y)) => Some(x.max(y)),
                    _ => None,
                };
                Limits::Path(a)
            }
            (Limits::Path(p), Limits::Depth(d)) | (Limits::Depth(d), Limits::Path(p)) => {
                let cap = p.max_depth.map_or(d.max, |existing| existing.max(d.max));
                Limits::Path(p.with_max_depth(cap))
            }
            (Limits::Composite(members), other) | (other, Limits::Composite(members)) => {
                Limits::Composite(members.into_iter().map(|m| m.and(other.clone())).collect())
            }
        }
    }
}

/// Scope entered by [`Limits::enter`]; leaves the segment when dropped.
pub struct ScopeGuard<'a> {
    limits: &'a mut Limits,
}

impl Deref for ScopeGuard<'_> {
    type Target = Limits;

    fn deref(&self) -> &Limits {
        self.limits
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Limits {
        self.limits
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.limits.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_and_end() {
        assert!(Limits::Unbounded.should_descend("x"));
        assert!(!Limits::End.should_descend("x"));
    }

    #[test]
    fn test_depth_counts_levels() {
        let mut limits = Limits::depth(2);
        assert!(limits.should_descend("a"));
        let mut a = limits.enter("a");
        assert!(a.should_descend("b"));
        let b = a.enter("b");
        assert!(!b.should_descend("c"));
        drop(b);
        assert!(a.should_descend("b"));
        drop(a);
        assert_eq!(limits.current_depth(), Some(0));
    }

    #[test]
    fn test_depth_zero_never_descends() {
        assert!(!Limits::depth(0).should_descend("a"));
    }

    #[test]
    fn test_guard_exits_on_error_path() {
        fn failing(limits: &mut Limits) -> Result<()> {
            let _scope = limits.enter("a");
            Err(crate::error::BlueError::Structure("boom".into()))
        }
        let mut limits = Limits::path("/a/b").unwrap();
        assert!(failing(&mut limits).is_err());
        assert_eq!(limits.current_depth(), Some(0));
        assert!(limits.should_descend("a"));
    }

    #[test]
    fn test_path_scope_walk() {
        let mut limits = Limits::path("/a/a1").unwrap();
        assert!(limits.should_descend("a"));
        assert!(!limits.should_descend("b"));
        assert!(!limits.should_descend("c"));
        let mut a = limits.enter("a");
        assert!(a.should_descend("a1"));
        assert!(!a.should_descend("a2"));
        let a1 = a.enter("a1");
        assert!(!a1.should_descend("anything"));
    }

    #[test]
    fn test_composite_is_intersection() {
        let mut limits = Limits::composite(vec![
            Limits::path("/a/**").unwrap(),
            Limits::depth(2),
        ]);
        assert!(limits.should_descend("a"));
        assert!(!limits.should_descend("b"));
        let mut a = limits.enter("a");
        assert!(a.should_descend("x"));
        let x = a.enter("x");
        assert!(!x.should_descend("y"));
    }

    #[test]
    fn test_depth_and_depth_takes_maximum() {
        let combined = Limits::depth(1).and(Limits::depth(3));
        assert_eq!(combined, Limits::depth(3));
    }

    #[test]
    fn test_path_and_path_is_union() {
        let combined = Limits::path("/a").unwrap().and(Limits::path("/b").unwrap());
        assert!(combined.should_descend("a"));
        assert!(combined.should_descend("b"));
        assert!(!combined.should_descend("c"));
    }

    #[test]
    fn test_path_and_depth_caps_paths() {
        let mut combined = Limits::path("/a/**").unwrap().and(Limits::depth(1));
        assert!(combined.should_descend("a"));
        let a = combined.enter("a");
        assert!(!a.should_descend("b"));
    }

    #[test]
    fn test_neutral_elements() {
        assert_eq!(Limits::Unbounded.and(Limits::depth(2)), Limits::depth(2));
        assert_eq!(Limits::depth(2).and(Limits::End), Limits::depth(2));
    }

    #[test]
    fn test_root_only() {
        assert!(!Limits::root_only().should_descend("a"));
        assert!(!Limits::root_only().should_descend_index(0));
    }

    #[test]
    fn test_index_segments() {
        let mut limits = Limits::path("/c/0").unwrap();
        let c = limits.enter("c");
        assert!(c.should_descend_index(0));
        assert!(!c.should_descend_index(1));
    }
}
