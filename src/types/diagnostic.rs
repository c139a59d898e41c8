use std::fmt;

use super::error::CompileError;
use super::node::RuleNode;
use super::path::Path;
use crate::PathRulesError;

/// A scope that failed and was left out of the compiled tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    path: Path,
    error: CompileError,
}

impl Diagnostic {
    pub(crate) fn new(path: Path, error: CompileError) -> Self {
        Self { path, error }
    }

    /// Absolute path of the scope that failed. When the path expression
    /// itself could not be resolved, this is the enclosing scope's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn error(&self) -> &CompileError {
        &self.error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

/// Result of [`Compiler::compile`](crate::Compiler::compile): the best-effort
/// tree plus one diagnostic per branch that was dropped.
#[derive(Debug, Clone)]
#[must_use]
pub struct Compilation {
    tree: RuleNode,
    diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub(crate) fn new(tree: RuleNode, diagnostics: Vec<Diagnostic>) -> Self {
        Self { tree, diagnostics }
    }

    #[must_use]
    pub fn tree(&self) -> &RuleNode {
        &self.tree
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True when every scope compiled without error.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn into_tree(self) -> RuleNode {
        self.tree
    }

    /// The tree, or an error if any scope was dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PathRulesError::Incomplete`] carrying every diagnostic when
    /// the compilation was not complete.
    pub fn into_result(self) -> Result<RuleNode, PathRulesError> {
        if self.diagnostics.is_empty() {
            Ok(self.tree)
        } else {
            Err(PathRulesError::Incomplete {
                diagnostics: self.diagnostics,
            })
        }
    }

    #[must_use]
    pub fn into_parts(self) -> (RuleNode, Vec<Diagnostic>) {
        (self.tree, self.diagnostics)
    }
}

impl fmt::Display for Compilation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Compilation({} nodes, {} predicates, {} diagnostics)",
            self.tree.len(),
            self.tree.predicate_count(),
            self.diagnostics.len(),
        )
    }
}
