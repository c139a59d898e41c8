use super::category::RuleCategory;
use super::error::CompileError;
use super::predicate::Predicate;
use crate::Scope;

/// Something that can run inside a scope and contribute to its rule node.
///
/// Implemented for closures taking a [`Scope`], for [`Directives`], and for
/// [`Declaration`]s (singly or as a `Vec`), so a scope body can be written as
/// code or assembled as data.
pub trait Body {
    /// Run this body against `scope`.
    ///
    /// # Errors
    ///
    /// Any error returned here makes the enclosing `at` call drop the whole
    /// scope and record a diagnostic instead.
    fn run(self, scope: &mut Scope<'_>) -> Result<(), CompileError>;
}

impl<F> Body for F
where
    F: FnOnce(&mut Scope<'_>) -> Result<(), CompileError>,
{
    fn run(self, scope: &mut Scope<'_>) -> Result<(), CompileError> {
        self(scope)
    }
}

/// A single data-driven declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// Union a predicate into the current scope's set for a category.
    Add(RuleCategory, Predicate),
    /// Dispatch a directive mapping against the current scope.
    Authorize(Directives),
    /// Open a nested scope at `path` and run `body` in it.
    At { path: String, body: Vec<Declaration> },
}

impl Declaration {
    pub fn add(category: RuleCategory, predicate: impl Into<Predicate>) -> Self {
        Declaration::Add(category, predicate.into())
    }

    pub fn validate(predicate: impl Into<Predicate>) -> Self {
        Declaration::Add(RuleCategory::Validate, predicate.into())
    }

    pub fn authorize(directives: Directives) -> Self {
        Declaration::Authorize(directives)
    }

    pub fn at(path: impl Into<String>, body: Vec<Declaration>) -> Self {
        Declaration::At {
            path: path.into(),
            body,
        }
    }
}

impl Body for Declaration {
    fn run(self, scope: &mut Scope<'_>) -> Result<(), CompileError> {
        match self {
            Declaration::Add(category, predicate) => {
                scope.add(category, predicate);
                Ok(())
            }
            Declaration::Authorize(directives) => scope.authorize(directives),
            Declaration::At { path, body } => {
                // A failed nested scope is already recorded; it does not fail
                // this one.
                scope.at_body(&path, body);
                Ok(())
            }
        }
    }
}

impl Body for Vec<Declaration> {
    fn run(self, scope: &mut Scope<'_>) -> Result<(), CompileError> {
        self.into_iter().try_for_each(|decl| decl.run(scope))
    }
}

/// The value half of a directive entry.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveValue {
    Predicate(Predicate),
    Nested(Directives),
    Body(Vec<Declaration>),
}

impl From<Predicate> for DirectiveValue {
    fn from(p: Predicate) -> Self {
        DirectiveValue::Predicate(p)
    }
}

impl From<&str> for DirectiveValue {
    fn from(s: &str) -> Self {
        DirectiveValue::Predicate(Predicate::from(s))
    }
}

impl From<String> for DirectiveValue {
    fn from(s: String) -> Self {
        DirectiveValue::Predicate(Predicate::from(s))
    }
}

impl From<Directives> for DirectiveValue {
    fn from(d: Directives) -> Self {
        DirectiveValue::Nested(d)
    }
}

impl From<Vec<Declaration>> for DirectiveValue {
    fn from(body: Vec<Declaration>) -> Self {
        DirectiveValue::Body(body)
    }
}

/// A directive mapping: tag/value entries dispatched one by one.
///
/// A tag that names a [`RuleCategory`] adds its predicate to the current
/// scope. Any other tag is exactly one child segment (`$name` captures a
/// variable, anything else is literal text) and its value is run as the body
/// of a nested scope.
///
/// # Example
///
/// ```
/// use pathrules::{Compiler, Directives, RuleCategory};
///
/// let directives = Directives::new()
///     .rule(RuleCategory::Read, "auth != null")
///     .child("profile", Directives::new().rule(RuleCategory::Write, "auth.uid == $uid"));
///
/// let mut compiler = Compiler::new();
/// let tree = compiler.at_body("users/$uid", directives).unwrap();
/// assert_eq!(tree.paths().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directives {
    entries: Vec<(String, DirectiveValue)>,
}

impl Directives {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw `tag: value` entry.
    #[must_use]
    pub fn entry(mut self, tag: impl Into<String>, value: impl Into<DirectiveValue>) -> Self {
        self.entries.push((tag.into(), value.into()));
        self
    }

    /// Append a category entry.
    #[must_use]
    pub fn rule(self, category: RuleCategory, predicate: impl Into<Predicate>) -> Self {
        self.entry(category.name(), DirectiveValue::Predicate(predicate.into()))
    }

    /// Append a child-segment entry with a nested mapping.
    #[must_use]
    pub fn child(self, tag: impl Into<String>, nested: Directives) -> Self {
        self.entry(tag, DirectiveValue::Nested(nested))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DirectiveValue)> {
        self.entries.iter().map(|(tag, value)| (tag.as_str(), value))
    }
}

impl IntoIterator for Directives {
    type Item = (String, DirectiveValue);
    type IntoIter = std::vec::IntoIter<(String, DirectiveValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Directives
where
    K: Into<String>,
    V: Into<DirectiveValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(tag, value)| (tag.into(), value.into()))
                .collect(),
        }
    }
}

impl Body for Directives {
    fn run(self, scope: &mut Scope<'_>) -> Result<(), CompileError> {
        scope.authorize(self)
    }
}
