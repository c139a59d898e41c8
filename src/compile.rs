use std::fmt;

use tracing::{debug, warn};

use crate::parse::{PathResolver, SlashPathResolver};
use crate::scope::{Scope, ScopeStack};
use crate::types::merge_pruned;
use crate::{
    Body, Compilation, CompileError, CompilerConfig, Diagnostic, Path, PathSegment, RuleNode,
};

/// Compiles nested, path-scoped declarations into a single [`RuleNode`] tree.
///
/// Every scope opened with [`at`](Self::at) gets its own accumulator. When
/// the scope's body finishes, its node is merged into the enclosing scope at
/// the scope's path and empty branches are pruned. A scope whose body fails is
/// dropped whole and recorded as a [`Diagnostic`]; its siblings and ancestors
/// carry on.
///
/// # Example
///
/// ```
/// use pathrules::{Compiler, PathSegment, RuleCategory};
///
/// let mut compiler = Compiler::new();
/// let compilation = compiler.compile(|root| {
///     root.at("users/$uid", |user| {
///         user.add(RuleCategory::Read, "auth.uid == $uid");
///         Ok(())
///     });
///     Ok(())
/// });
///
/// let node = compilation
///     .tree()
///     .get(&[PathSegment::literal("users"), PathSegment::variable("uid")])
///     .unwrap();
/// assert_eq!(node.predicates(RuleCategory::Read).unwrap().len(), 1);
/// ```
pub struct Compiler {
    pub(crate) stack: ScopeStack,
    config: CompilerConfig,
    resolver: Box<dyn PathResolver>,
    diagnostics: Vec<Diagnostic>,
}

impl Compiler {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: CompilerConfig) -> Self {
        Self {
            stack: ScopeStack::default(),
            config,
            resolver: Box::new(SlashPathResolver),
            diagnostics: Vec::new(),
        }
    }

    /// Replace the path resolver used for every `at` call.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl PathResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Run `body` in a scope at `path_expr` and return the merged tree.
    ///
    /// Called at the top level this is the leaf re-rooted at the path. The
    /// returned tree is the enclosing accumulator after merging, which the
    /// enclosing scope (if any) also adopts. Returns `None` if the path could
    /// not be resolved or the body failed; the failure is logged and kept in
    /// [`diagnostics`](Self::diagnostics).
    pub fn at<F>(&mut self, path_expr: &str, body: F) -> Option<RuleNode>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<(), CompileError>,
    {
        run_scope(self, path_expr, body)
    }

    /// Like [`at`](Self::at), for any [`Body`] value.
    pub fn at_body(&mut self, path_expr: &str, body: impl Body) -> Option<RuleNode> {
        run_scope(self, path_expr, body)
    }

    /// Run `body` in a root scope and return the whole tree it built.
    ///
    /// Unlike repeated top-level [`at`](Self::at) calls, every scope opened
    /// inside `body` accumulates into the same tree. Only diagnostics raised
    /// by this compilation move into the result; earlier ones stay on the
    /// compiler.
    pub fn compile<F>(&mut self, body: F) -> Compilation
    where
        F: FnOnce(&mut Scope<'_>) -> Result<(), CompileError>,
    {
        self.compile_body(body)
    }

    /// Like [`compile`](Self::compile), for any [`Body`] value.
    pub fn compile_body(&mut self, body: impl Body) -> Compilation {
        let earlier = self.diagnostics.len();
        let tree = run_resolved(self, Vec::new(), body).unwrap_or_default();
        let diagnostics = self.diagnostics.split_off(earlier);
        debug!(
            nodes = tree.len(),
            predicates = tree.predicate_count(),
            diagnostics = diagnostics.len(),
            "compilation finished"
        );
        Compilation::new(tree, diagnostics)
    }

    /// Failures recorded since the last drain.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn report(&mut self, path: Path, error: CompileError) {
        warn!(path = %path, error = %error, "at error");
        self.diagnostics.push(Diagnostic::new(path, error));
    }

    fn current_path(&self) -> Path {
        self.stack
            .current()
            .map(|context| context.path().clone())
            .unwrap_or_default()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("stack", &self.stack)
            .field("config", &self.config)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

pub(crate) fn run_scope(compiler: &mut Compiler, path_expr: &str, body: impl Body) -> Option<RuleNode> {
    match compiler.resolver.resolve(path_expr) {
        Ok(path) => run_resolved(compiler, path.into_segments(), body),
        Err(err) => {
            let at = compiler.current_path();
            compiler.report(at, err.into());
            None
        }
    }
}

pub(crate) fn run_resolved(compiler: &mut Compiler, segments: Vec<PathSegment>, body: impl Body) -> Option<RuleNode> {
    let path = compiler.current_path().join(&segments);

    let limit = compiler.config.depth_limit();
    if compiler.stack.depth() >= limit {
        compiler.report(path, CompileError::DepthExceeded { limit });
        return None;
    }

    let handle = compiler.stack.push(path.clone());
    let depth = handle.depth();
    let outcome = body.run(&mut Scope::new(compiler, depth));
    // Popped before the outcome is inspected so a failed body never leaves
    // its frame on the stack.
    let leaf = compiler.stack.pop(handle).into_node();

    if let Err(error) = outcome {
        compiler.report(path, error);
        return None;
    }

    let updated = match compiler.stack.current_mut() {
        Some(parent) => {
            merge_pruned(parent.node_mut(), &segments, leaf);
            parent.node().clone()
        }
        None => {
            let mut rerooted = RuleNode::new();
            merge_pruned(&mut rerooted, &segments, leaf);
            rerooted
        }
    };
    debug!(path = %path, "scope merged");
    Some(updated)
}
