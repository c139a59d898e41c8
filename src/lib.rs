//! Compiles path-scoped authorization declarations into one hierarchical
//! rule tree.
//!
//! Declarations are grouped into nested scopes, each bound to a path in a
//! hierarchical datastore. Every scope accumulates, per [`RuleCategory`], the
//! [`Predicate`]s that must hold at its path. When a scope finishes, its
//! result is merged into the enclosing scope and pruned, so the outermost call
//! yields the complete [`RuleNode`] tree. A scope that fails is dropped and
//! reported as a [`Diagnostic`] without disturbing the rest of the tree.
//!
//! ```
//! use pathrules::{Compiler, Directives, RuleCategory};
//!
//! let mut compiler = Compiler::new();
//! let compilation = compiler.compile(|root| {
//!     root.at("users/$uid", |user| {
//!         user.add(RuleCategory::Read, "auth.uid == $uid");
//!         user.authorize(
//!             Directives::new()
//!                 .rule(RuleCategory::Write, "auth.uid == $uid")
//!                 .child("email", Directives::new().rule(RuleCategory::Validate, "newData.isString()")),
//!         )
//!     });
//!     Ok(())
//! });
//!
//! assert!(compilation.is_complete());
//! assert_eq!(compilation.tree().paths().len(), 2);
//! ```

mod compile;
mod dispatch;
mod error;
pub mod parse;
mod scope;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use compile::Compiler;
pub use error::PathRulesError;
pub use parse::{parse_path, ParseError, PathResolver, SlashPathResolver};
pub use scope::{BuildContext, Scope};
pub use types::{
    merge_rules, prune_empty, Body, Compilation, CompileError, CompilerConfig, Declaration,
    Diagnostic, DirectiveValue, Directives, DispatchPolicy, Path, PathSegment, Predicate,
    RuleCategory, RuleNode, UnknownCategory,
};

#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
