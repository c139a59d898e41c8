use thiserror::Error;

use crate::parse::ParseError;
use crate::{CompileError, Diagnostic};

/// Unified error type covering path parsing, scope compilation, and the
/// binary cache.
///
/// Returned by all-or-nothing helpers like
/// [`Compilation::into_result()`](crate::Compilation::into_result).
#[derive(Debug, Error)]
pub enum PathRulesError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("compilation dropped {} scope(s), first at {}", .diagnostics.len(), first_path(.diagnostics))]
    Incomplete { diagnostics: Vec<Diagnostic> },

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}

fn first_path(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map_or_else(|| "/".to_owned(), |d| d.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Path, PathSegment};

    #[test]
    fn incomplete_message() {
        let err = PathRulesError::Incomplete {
            diagnostics: vec![Diagnostic::new(
                Path::new(vec![PathSegment::literal("broken")]),
                CompileError::predicate("boom"),
            )],
        };
        assert_eq!(
            err.to_string(),
            "compilation dropped 1 scope(s), first at /broken"
        );
    }

    #[test]
    fn parse_error_converts() {
        fn resolve(expr: &str) -> Result<Path, PathRulesError> {
            Ok(crate::parse_path(expr)?)
        }
        assert!(matches!(resolve("$"), Err(PathRulesError::Parse(_))));
    }
}
