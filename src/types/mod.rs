mod category;
mod config;
mod declaration;
mod diagnostic;
mod error;
mod node;
mod path;
mod predicate;

pub use category::{RuleCategory, UnknownCategory};
pub use config::{CompilerConfig, DispatchPolicy};
pub use declaration::{Body, Declaration, DirectiveValue, Directives};
pub use diagnostic::{Compilation, Diagnostic};
pub use error::CompileError;
pub(crate) use node::merge_pruned;
pub use node::{merge_rules, prune_empty, RuleNode};
pub use path::{Path, PathSegment};
pub use predicate::Predicate;
