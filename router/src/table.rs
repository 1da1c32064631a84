//! Route storage grouped by root word.
//!
//! The table is filled during setup through `&mut` access and only read
//! during dispatch.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::pattern::Pattern;

/// A registered pattern with its handler.
#[derive(Debug)]
pub struct Route<H> {
    pattern: Pattern,
    handler: H,
}

impl<H> Route<H> {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// Mapping from root word to its competing routes, in registration order.
///
/// # Examples
///
/// ```
/// use cmdln_router::{ConfigError, Pattern, RouteTable};
///
/// let mut table = RouteTable::new(false);
/// table.insert(Pattern::parse("deploy :env", ':').unwrap(), "deploy").unwrap();
/// table.insert(Pattern::parse("deploy :env now", ':').unwrap(), "deploy-now").unwrap();
///
/// // Same skeleton as `deploy :env`, root words are not part of it.
/// let err = table.insert(Pattern::parse("rollback :target", ':').unwrap(), "rollback");
/// assert!(matches!(err, Err(ConfigError::DuplicatePattern { .. })));
///
/// assert_eq!(table.candidates("deploy").len(), 2);
/// assert!(table.candidates("rollback").is_empty());
/// ```
#[derive(Debug)]
pub struct RouteTable<H> {
    routes: HashMap<String, Vec<Route<H>>>,
    seen: HashSet<String>,
    root_scoped: bool,
}

impl<H> RouteTable<H> {
    /// Creates an empty table.
    ///
    /// With `root_scoped` set, duplicate detection only compares patterns
    /// under the same root word.
    pub fn new(root_scoped: bool) -> Self {
        Self {
            routes: HashMap::new(),
            seen: HashSet::new(),
            root_scoped,
        }
    }

    /// Registers a route.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicatePattern`] if a pattern with the same
    /// normalized form is already present.
    pub fn insert(&mut self, pattern: Pattern, handler: H) -> Result<()> {
        let normalized = pattern.normalized();
        let key = if self.root_scoped {
            format!("{} {}", pattern.root(), normalized)
        } else {
            normalized.clone()
        };

        if !self.seen.insert(key) {
            return Err(ConfigError::DuplicatePattern {
                pattern: pattern.source().to_string(),
                normalized,
            });
        }

        debug!(pattern = %pattern, normalized = %normalized, "Registered route");
        self.routes
            .entry(pattern.root().to_string())
            .or_default()
            .push(Route { pattern, handler });
        Ok(())
    }

    /// Routes registered under `root`, or an empty slice.
    pub fn candidates(&self, root: &str) -> &[Route<H>] {
        self.routes.get(root).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates over all routes, grouped by root word.
    pub fn iter(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.values().flatten()
    }

    /// Iterates over every registered root word.
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Total number of routes.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(s: &str) -> Pattern {
        Pattern::parse(s, ':').unwrap()
    }

    #[test]
    fn test_groups_by_root_in_order() {
        let mut table = RouteTable::default();
        table.insert(pattern("task run"), 1).unwrap();
        table.insert(pattern("task :name"), 2).unwrap();
        table.insert(pattern("build"), 3).unwrap();

        let task: Vec<_> = table.candidates("task").iter().map(|r| *r.handler()).collect();
        assert_eq!(task, vec![1, 2]);
        assert_eq!(table.len(), 3);
        let mut roots: Vec<_> = table.roots().collect();
        roots.sort_unstable();
        assert_eq!(roots, vec!["build", "task"]);
    }

    #[test]
    fn test_duplicate_capture_names_rejected() {
        let mut table = RouteTable::default();
        table.insert(pattern("task :name"), ()).unwrap();
        let err = table.insert(pattern("task :id"), ()).unwrap_err();
        match err {
            ConfigError::DuplicatePattern {
                pattern,
                normalized,
            } => {
                assert_eq!(pattern, "task :id");
                assert_eq!(normalized, ":");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_root_words_are_not_part_of_skeleton() {
        let mut table = RouteTable::default();
        table.insert(pattern("start"), ()).unwrap();
        assert!(table.insert(pattern("stop"), ()).is_err());
    }

    #[test]
    fn test_root_scoped_allows_same_skeleton_under_other_root() {
        let mut table = RouteTable::new(true);
        table.insert(pattern("start :svc"), ()).unwrap();
        table.insert(pattern("stop :svc"), ()).unwrap();
        assert!(table.insert(pattern("stop :other"), ()).is_err());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_unknown_root_has_no_candidates() {
        let table: RouteTable<()> = RouteTable::default();
        assert!(table.candidates("deploy").is_empty());
        assert!(table.is_empty());
    }
}
