//! Patch strategies and their path-based resolution
//!
//! Provides [`PatchStrategies`], a path → [`PatchStrategy`] table with
//! most-specific-prefix lookup.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use pcfg_tree::{Node, NodePath};

use crate::error::PatchError;

/// How incoming data reconciles with existing data at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PatchStrategy {
    /// Union children by key, recursing into conflicts
    #[default]
    Merge,
    /// Incoming subtree supersedes the existing one
    Replace,
}

impl PatchStrategy {
    /// Lowercase name as written in metadata
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Replace => "replace",
        }
    }
}

impl Display for PatchStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatchStrategy {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "replace" => Ok(Self::Replace),
            _ => Err(PatchError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Table of configured strategies
///
/// Paths without an entry, and without a configured ancestor, resolve to
/// [`PatchStrategy::Merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchStrategies {
    entries: BTreeMap<NodePath, PatchStrategy>,
}

impl PatchStrategies {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a `path: strategy` mapping node
    ///
    /// Entries whose key is not a valid path or whose value is not a known
    /// strategy are skipped with a warning. A non-mapping node yields an
    /// empty table.
    #[must_use]
    pub fn from_node(node: &Node) -> Self {
        let mut table = Self::new();
        let Some(mapping) = node.as_mapping() else {
            if !node.is_null() {
                tracing::warn!(found = %node.kind(), "patch strategy section is not a mapping");
            }
            return table;
        };
        for (key, value) in mapping {
            let path = match key.parse::<NodePath>() {
                Ok(path) if !path.is_empty() => path,
                _ => {
                    tracing::warn!(path = %key, "ignoring patch strategy with invalid path");
                    continue;
                }
            };
            let parsed = value
                .as_scalar()
                .map(|s| s.text().parse::<PatchStrategy>());
            match parsed {
                Some(Ok(strategy)) => table.insert(path, strategy),
                _ => tracing::warn!(%path, "ignoring unknown patch strategy"),
            }
        }
        table
    }

    /// Add or overwrite an entry
    #[inline]
    pub fn insert(&mut self, path: NodePath, strategy: PatchStrategy) {
        self.entries.insert(path, strategy);
    }

    /// Add an entry, returning the table
    #[must_use]
    pub fn with(mut self, path: NodePath, strategy: PatchStrategy) -> Self {
        self.insert(path, strategy);
        self
    }

    /// Resolve the strategy for a path
    ///
    /// An exact entry wins; otherwise the closest configured ancestor;
    /// otherwise [`PatchStrategy::Merge`].
    #[must_use]
    pub fn strategy_for(&self, path: &NodePath) -> PatchStrategy {
        path.ancestors()
            .find_map(|p| self.entries.get(&p).copied())
            .unwrap_or_default()
    }

    /// Number of configured entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for an empty table
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&NodePath, PatchStrategy)> {
        self.entries.iter().map(|(p, s)| (p, *s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcfg_tree::Document;

    fn path(s: &str) -> NodePath {
        s.parse().unwrap()
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Replace".parse::<PatchStrategy>().unwrap(), PatchStrategy::Replace);
        assert_eq!(" MERGE ".parse::<PatchStrategy>().unwrap(), PatchStrategy::Merge);
        assert!("overwrite".parse::<PatchStrategy>().is_err());
    }

    #[test]
    fn default_is_merge() {
        let table = PatchStrategies::new();
        assert_eq!(table.strategy_for(&path("contexts.name")), PatchStrategy::Merge);
    }

    #[test]
    fn exact_match_wins() {
        let table = PatchStrategies::new()
            .with(path("contexts"), PatchStrategy::Replace)
            .with(path("contexts.discoverySources"), PatchStrategy::Merge);
        assert_eq!(
            table.strategy_for(&path("contexts.discoverySources")),
            PatchStrategy::Merge
        );
        assert_eq!(table.strategy_for(&path("contexts")), PatchStrategy::Replace);
    }

    #[test]
    fn most_specific_ancestor_wins() {
        let table = PatchStrategies::new()
            .with(path("contexts"), PatchStrategy::Merge)
            .with(path("contexts.clusterOpts"), PatchStrategy::Replace);
        assert_eq!(
            table.strategy_for(&path("contexts.clusterOpts.endpoint")),
            PatchStrategy::Replace
        );
        assert_eq!(table.strategy_for(&path("contexts.globalOpts")), PatchStrategy::Merge);
        assert_eq!(table.strategy_for(&path("servers")), PatchStrategy::Merge);
    }

    #[test]
    fn from_node_skips_bad_entries() {
        let doc = Document::parse(
            "contexts.discoverySources: REPLACE\nservers: bogus\na..b: replace\nlist: []\n",
        )
        .unwrap();
        let table = PatchStrategies::from_node(doc.root());
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.strategy_for(&path("contexts.discoverySources")),
            PatchStrategy::Replace
        );
    }

    #[test]
    fn from_non_mapping_is_empty() {
        assert!(PatchStrategies::from_node(&Node::string("replace")).is_empty());
        assert!(PatchStrategies::from_node(&Node::null()).is_empty());
    }
}
