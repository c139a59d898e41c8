use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::category::RuleCategory;
use super::path::{Path, PathSegment};
use super::predicate::Predicate;

/// One node of a compiled rule tree.
///
/// Each node carries, per [`RuleCategory`], the set of predicates that must
/// hold for that operation at this path, plus its child subtrees keyed by
/// [`PathSegment`]. Both maps are ordered so that iteration (and anything
/// serialized from it) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleNode {
    pub(crate) rules: BTreeMap<RuleCategory, BTreeSet<Predicate>>,
    pub(crate) children: BTreeMap<PathSegment, RuleNode>,
}

impl RuleNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_rule(mut self, category: RuleCategory, predicate: impl Into<Predicate>) -> Self {
        self.insert(category, predicate.into());
        self
    }

    /// Builder form that attaches `child` under `segment`, merging with any
    /// existing child on the same edge.
    #[must_use]
    pub fn with_child(mut self, segment: PathSegment, child: RuleNode) -> Self {
        self.children.entry(segment).or_default().merge(&child);
        self
    }

    /// Add a predicate to this node's set for `category`.
    ///
    /// Returns `false` if the predicate was already present.
    pub fn insert(&mut self, category: RuleCategory, predicate: Predicate) -> bool {
        self.rules.entry(category).or_default().insert(predicate)
    }

    /// True iff no category holds a predicate and there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.values().all(BTreeSet::is_empty) && self.children.is_empty()
    }

    #[must_use]
    pub fn rules(&self) -> &BTreeMap<RuleCategory, BTreeSet<Predicate>> {
        &self.rules
    }

    #[must_use]
    pub fn children(&self) -> &BTreeMap<PathSegment, RuleNode> {
        &self.children
    }

    /// The predicate set for `category`, if one has been declared here.
    #[must_use]
    pub fn predicates(&self, category: RuleCategory) -> Option<&BTreeSet<Predicate>> {
        self.rules.get(&category)
    }

    #[must_use]
    pub fn child(&self, segment: &PathSegment) -> Option<&RuleNode> {
        self.children.get(segment)
    }

    /// Walk `path` from this node. The empty path returns `self`.
    #[must_use]
    pub fn get(&self, path: &[PathSegment]) -> Option<&RuleNode> {
        match path.split_first() {
            None => Some(self),
            Some((head, tail)) => self.children.get(head)?.get(tail),
        }
    }

    /// Number of nodes in this tree, including `self`.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.values().map(RuleNode::len).sum::<usize>()
    }

    /// Total number of predicates across every category and node.
    #[must_use]
    pub fn predicate_count(&self) -> usize {
        self.rules.values().map(BTreeSet::len).sum::<usize>()
            + self
                .children
                .values()
                .map(RuleNode::predicate_count)
                .sum::<usize>()
    }

    /// Paths (relative to this node) of every node that declares at least one
    /// predicate, in depth-first order.
    #[must_use]
    pub fn paths(&self) -> Vec<Path> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        self.collect_paths(&mut prefix, &mut out);
        out
    }

    fn collect_paths(&self, prefix: &mut Vec<PathSegment>, out: &mut Vec<Path>) {
        if self.rules.values().any(|set| !set.is_empty()) {
            out.push(Path::new(prefix.clone()));
        }
        for (segment, child) in &self.children {
            prefix.push(segment.clone());
            child.collect_paths(prefix, out);
            prefix.pop();
        }
    }

    /// Union `other` into this node: predicate sets are unioned per category
    /// and children are merged recursively by segment.
    pub fn merge(&mut self, other: &RuleNode) {
        for (category, predicates) in &other.rules {
            self.rules
                .entry(*category)
                .or_default()
                .extend(predicates.iter().cloned());
        }
        for (segment, child) in &other.children {
            self.children
                .entry(segment.clone())
                .or_default()
                .merge(child);
        }
    }

    /// Drop empty predicate sets and empty subtrees, in place.
    pub fn prune(&mut self) {
        self.rules.retain(|_, set| !set.is_empty());
        self.children.retain(|_, child| {
            child.prune();
            !child.is_empty()
        });
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        for (category, predicates) in &self.rules {
            if let Some(joined) = Predicate::any_of(predicates) {
                writeln!(f, "{pad}.{category} = {joined}")?;
            }
        }
        for (segment, child) in &self.children {
            writeln!(f, "{pad}{segment}")?;
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

#[cfg(feature = "binary-cache")]
impl RuleNode {
    /// Serialize this tree to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata. Callers can use this to detect when the declaration
    /// source has changed and the cache should be rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a tree from a byte slice previously produced by
    /// [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Serialize this tree and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a file and deserialize the tree it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for RuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Merge `addition` into `target` at `path`, returning a new tree.
///
/// An absent `target` is treated as an empty node. At the empty path this is
/// a full recursive union; otherwise only the child on `path` is rebuilt and
/// every other part of `target` is carried over unchanged. Neither input is
/// modified, and merging the same addition twice is the same as merging it
/// once.
#[must_use]
pub fn merge_rules(target: Option<&RuleNode>, path: &[PathSegment], addition: &RuleNode) -> RuleNode {
    let mut result = target.cloned().unwrap_or_default();
    merge_at(&mut result, path, addition);
    result
}

fn merge_at(node: &mut RuleNode, path: &[PathSegment], addition: &RuleNode) {
    match path.split_first() {
        None => node.merge(addition),
        Some((head, tail)) => {
            // `entry` keeps the key already in the map, so an existing
            // variable name survives a merge with a differently named one.
            let child = node.children.entry(head.clone()).or_default();
            merge_at(child, tail, addition);
        }
    }
}

/// Merge `addition` into `node` at `path` in place, keeping `node` pruned.
///
/// `node` must already be pruned. Only the nodes along `path` and the
/// nodes of `addition` are visited.
pub(crate) fn merge_pruned(node: &mut RuleNode, path: &[PathSegment], addition: RuleNode) {
    match path.split_first() {
        None => node.merge(&prune_empty(addition)),
        Some((head, tail)) => {
            let child = node.children.entry(head.clone()).or_default();
            merge_pruned(child, tail, addition);
            if child.is_empty() {
                node.children.remove(head);
            }
        }
    }
}

/// Return `node` with empty categories and empty subtrees removed.
#[must_use]
pub fn prune_empty(mut node: RuleNode) -> RuleNode {
    node.prune();
    node
}
