use std::cmp::Ordering;
use std::fmt;

/// One edge of a rule tree.
///
/// A `Literal` matches exactly one child key. A `Variable` matches any key at
/// that position and binds its name for predicates in the subtree.
///
/// Equality and ordering treat every `Variable` as the same edge, whatever
/// its bound name, so variable segments at one position merge together. When
/// two differently named variables meet, the name already in the tree wins.
#[derive(Debug, Clone)]
pub enum PathSegment {
    Literal(String),
    Variable(String),
}

impl PathSegment {
    pub fn literal(text: impl Into<String>) -> Self {
        PathSegment::Literal(text.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        PathSegment::Variable(name.into())
    }

    /// A directive tag taken as exactly one segment. `$name` captures a
    /// variable; any other text, slashes and spaces included, is a literal.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.strip_prefix('$') {
            Some(name) if !name.is_empty() => PathSegment::variable(name),
            _ => PathSegment::literal(tag),
        }
    }

    /// The literal text or the bound variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            PathSegment::Literal(s) | PathSegment::Variable(s) => s,
        }
    }

    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, PathSegment::Variable(_))
    }
}

impl PartialEq for PathSegment {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathSegment {}

impl PartialOrd for PathSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PathSegment::Literal(a), PathSegment::Literal(b)) => a.cmp(b),
            (PathSegment::Variable(_), PathSegment::Variable(_)) => Ordering::Equal,
            (PathSegment::Literal(_), PathSegment::Variable(_)) => Ordering::Less,
            (PathSegment::Variable(_), PathSegment::Literal(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Literal(s) => f.write_str(s),
            PathSegment::Variable(name) => write!(f, "${name}"),
        }
    }
}

/// An ordered sequence of segments. The empty path denotes "this node".
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path(Vec<PathSegment>);

impl Path {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A new path with `tail` appended.
    #[must_use]
    pub fn join(&self, tail: &[PathSegment]) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + tail.len());
        segments.extend_from_slice(&self.0);
        segments.extend_from_slice(tail);
        Self(segments)
    }

    /// Names bound by the variable segments of this path, outermost first.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|s| s.is_variable())
            .map(PathSegment::name)
    }

    pub fn into_segments(self) -> Vec<PathSegment> {
        self.0
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
