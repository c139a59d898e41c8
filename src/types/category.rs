use std::fmt;
use std::str::FromStr;

/// Operation kinds a rule node can constrain.
///
/// Each category is independent: a node may carry predicates for several
/// categories at once, and a predicate added under one category never
/// leaks into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleCategory {
    Read,
    Create,
    Update,
    Delete,
    Validate,
    Write,
    Index,
    Children,
}

impl RuleCategory {
    /// All categories, in declaration order.
    pub const ALL: [RuleCategory; 8] = [
        RuleCategory::Read,
        RuleCategory::Create,
        RuleCategory::Update,
        RuleCategory::Delete,
        RuleCategory::Validate,
        RuleCategory::Write,
        RuleCategory::Index,
        RuleCategory::Children,
    ];

    /// The lowercase tag used for this category in directive mappings.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RuleCategory::Read => "read",
            RuleCategory::Create => "create",
            RuleCategory::Update => "update",
            RuleCategory::Delete => "delete",
            RuleCategory::Validate => "validate",
            RuleCategory::Write => "write",
            RuleCategory::Index => "index",
            RuleCategory::Children => "children",
        }
    }

    /// Look up a category by its exact tag. Returns `None` for anything else.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == tag)
    }

    /// Look up a category ignoring ASCII case.
    #[must_use]
    pub(crate) fn from_tag_ignore_case(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string is not one of the eight category tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown rule category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for RuleCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}
