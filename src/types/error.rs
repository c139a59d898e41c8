use thiserror::Error;

use crate::parse::ParseError;

use super::category::RuleCategory;

/// Failures raised while executing a scope body.
///
/// None of these abort a compilation. Each is caught at the `at` call that
/// introduced the failing scope, logged, and recorded as a
/// [`Diagnostic`](super::Diagnostic); that scope simply contributes nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Resolve(#[from] ParseError),

    #[error("directive '{tag}' is a rule category and expects a predicate")]
    ExpectedPredicate { tag: String },

    #[error("directive '{tag}' names a child path and expects a nested body")]
    ExpectedBody { tag: String },

    #[error("tag '{tag}' collides with rule category '{category}'")]
    CategoryCollision { tag: String, category: RuleCategory },

    #[error("scope nesting exceeds limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("predicate construction failed: {0}")]
    Predicate(String),
}

impl CompileError {
    /// Report a predicate that could not be built inside a scope body.
    pub fn predicate(message: impl Into<String>) -> Self {
        CompileError::Predicate(message.into())
    }
}
