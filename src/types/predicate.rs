use std::collections::BTreeSet;
use std::fmt;

/// An opaque boolean expression contributed by an external expression
/// compiler.
///
/// The rule tree never interprets a predicate. It only deduplicates
/// predicates by equality and hands them through to whatever serializes the
/// finished tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Predicate(String);

impl Predicate {
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// The predicate's source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// OR-join a set of predicates into a single expression string.
    ///
    /// Returns `None` for an empty set. A single predicate is returned as-is;
    /// multiple predicates are each parenthesized and joined with `||`.
    #[must_use]
    pub fn any_of(set: &BTreeSet<Predicate>) -> Option<String> {
        match set.len() {
            0 => None,
            1 => set.iter().next().map(|p| p.0.clone()),
            _ => Some(
                set.iter()
                    .map(|p| format!("({})", p.0))
                    .collect::<Vec<_>>()
                    .join(" || "),
            ),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Predicate {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Predicate {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_of_empty_is_none() {
        assert_eq!(Predicate::any_of(&BTreeSet::new()), None);
    }

    #[test]
    fn any_of_single_is_unwrapped() {
        let set = BTreeSet::from([Predicate::from("auth != null")]);
        assert_eq!(Predicate::any_of(&set).as_deref(), Some("auth != null"));
    }

    #[test]
    fn any_of_joins_in_sorted_order() {
        let set = BTreeSet::from([Predicate::from("b"), Predicate::from("a")]);
        assert_eq!(Predicate::any_of(&set).as_deref(), Some("(a) || (b)"));
    }

    #[test]
    fn equal_text_deduplicates() {
        let set: BTreeSet<Predicate> = ["x", "x", "y"].into_iter().map(Predicate::from).collect();
        assert_eq!(set.len(), 2);
    }
}
