use tracing::trace;

use crate::compile::{run_resolved, run_scope, Compiler};
use crate::{
    Body, CompileError, Directives, DispatchPolicy, Path, PathSegment, Predicate, RuleCategory,
    RuleNode,
};

/// The in-progress rule node of one live scope, plus its absolute path.
///
/// Created empty when a scope is entered and discarded once its node has
/// been merged into the enclosing scope. It never outlives its scope.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    path: Path,
    node: RuleNode,
}

impl BuildContext {
    pub(crate) fn new(path: Path) -> Self {
        Self {
            path,
            node: RuleNode::new(),
        }
    }

    /// Absolute path of this scope from the root of the compilation.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn node(&self) -> &RuleNode {
        &self.node
    }

    pub(crate) fn node_mut(&mut self) -> &mut RuleNode {
        &mut self.node
    }

    pub(crate) fn into_node(self) -> RuleNode {
        self.node
    }
}

/// Proof that a frame was pushed. Consumed by [`ScopeStack::pop`].
#[derive(Debug)]
#[must_use]
pub(crate) struct ScopeHandle {
    depth: usize,
}

impl ScopeHandle {
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}

/// Stack of live scopes, innermost last.
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    frames: Vec<BuildContext>,
}

impl ScopeStack {
    pub(crate) fn push(&mut self, path: Path) -> ScopeHandle {
        self.frames.push(BuildContext::new(path));
        ScopeHandle {
            depth: self.frames.len(),
        }
    }

    /// Remove the frame `handle` refers to, along with anything left above
    /// it, and return that frame.
    pub(crate) fn pop(&mut self, handle: ScopeHandle) -> BuildContext {
        self.frames.truncate(handle.depth);
        self.frames.pop().unwrap_or_default()
    }

    pub(crate) fn current(&self) -> Option<&BuildContext> {
        self.frames.last()
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut BuildContext> {
        self.frames.last_mut()
    }

    pub(crate) fn frame(&self, depth: usize) -> &BuildContext {
        &self.frames[depth - 1]
    }

    pub(crate) fn frame_mut(&mut self, depth: usize) -> &mut BuildContext {
        &mut self.frames[depth - 1]
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Handle passed to every scope body.
///
/// All writes land in this scope's own [`BuildContext`]. Nested scopes opened
/// with [`at`](Self::at) merge into it once they complete successfully.
pub struct Scope<'c> {
    compiler: &'c mut Compiler,
    depth: usize,
}

impl<'c> Scope<'c> {
    pub(crate) fn new(compiler: &'c mut Compiler, depth: usize) -> Self {
        Self { compiler, depth }
    }

    /// Union `predicate` into this scope's set for `category`.
    pub fn add(&mut self, category: RuleCategory, predicate: impl Into<Predicate>) -> &mut Self {
        let predicate = predicate.into();
        let context = self.compiler.stack.frame_mut(self.depth);
        trace!(path = %context.path(), %category, %predicate, "add");
        context.node_mut().insert(category, predicate);
        self
    }

    /// Shorthand for `add(RuleCategory::Validate, predicate)`.
    pub fn validate(&mut self, predicate: impl Into<Predicate>) -> &mut Self {
        self.add(RuleCategory::Validate, predicate)
    }

    /// Dispatch a directive mapping against this scope.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] when an entry's value does not fit its tag, or
    /// when a tag collides with a category name under
    /// [`DispatchPolicy::Strict`].
    pub fn authorize(&mut self, directives: Directives) -> Result<(), CompileError> {
        crate::dispatch::dispatch(self, directives)
    }

    /// Open a nested scope at `path_expr` (relative to this one) and run
    /// `body` in it. See [`Compiler::at`].
    pub fn at<F>(&mut self, path_expr: &str, body: F) -> Option<RuleNode>
    where
        F: FnOnce(&mut Scope<'_>) -> Result<(), CompileError>,
    {
        run_scope(self.compiler, path_expr, body)
    }

    /// Like [`at`](Self::at), for any [`Body`] value.
    pub fn at_body(&mut self, path_expr: &str, body: impl Body) -> Option<RuleNode> {
        run_scope(self.compiler, path_expr, body)
    }

    /// Open a nested scope one `segment` below this one, bypassing the path
    /// resolver.
    pub(crate) fn descend(&mut self, segment: PathSegment, body: impl Body) -> Option<RuleNode> {
        run_resolved(self.compiler, vec![segment], body)
    }

    /// Absolute path of this scope.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.context().path()
    }

    /// Snapshot of everything accumulated in this scope so far, including
    /// nested scopes that have already completed.
    #[must_use]
    pub fn node(&self) -> &RuleNode {
        self.context().node()
    }

    #[must_use]
    pub fn context(&self) -> &BuildContext {
        self.compiler.stack.frame(self.depth)
    }

    /// Number of live scopes, this one included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn dispatch_policy(&self) -> DispatchPolicy {
        self.compiler.config().dispatch_policy()
    }
}
