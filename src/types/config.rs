/// How directive tags that are not exact category names are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// Anything that is not exactly a category name is a child path.
    #[default]
    Infer,
    /// Like `Infer`, but a tag that matches a category name only when case
    /// is ignored (e.g. `"Read"`) is rejected instead of becoming a path.
    Strict,
}

/// Compiler settings.
///
/// # Example
///
/// ```
/// use pathrules::{Compiler, CompilerConfig, DispatchPolicy};
///
/// let compiler = Compiler::with_config(
///     CompilerConfig::new()
///         .dispatch(DispatchPolicy::Strict)
///         .max_depth(16),
/// );
/// # let _ = compiler;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerConfig {
    pub(crate) dispatch: DispatchPolicy,
    pub(crate) max_depth: usize,
}

impl CompilerConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn dispatch(mut self, policy: DispatchPolicy) -> Self {
        self.dispatch = policy;
        self
    }

    /// Maximum number of live scopes, counting the root scope opened by
    /// [`Compiler::compile`](crate::Compiler::compile).
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn dispatch_policy(&self) -> DispatchPolicy {
        self.dispatch
    }

    #[must_use]
    pub fn depth_limit(&self) -> usize {
        self.max_depth
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchPolicy::Infer,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}
