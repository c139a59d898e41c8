mod error;
mod grammar;

pub use error::ParseError;

use crate::Path;

/// Turns a path expression into an ordered [`Path`].
///
/// The compiler is generic over this trait so that callers with their own
/// path syntax can plug it in. [`SlashPathResolver`] is the default.
/// Resolvers are `Send + Sync` so a [`Compiler`](crate::Compiler) can move
/// between threads.
pub trait PathResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ParseError`] if `expr` is not a valid path expression.
    fn resolve(&self, expr: &str) -> Result<Path, ParseError>;
}

/// Resolves `/`-separated expressions such as `users/$uid/profile`, where
/// `$name` is a variable-capture segment and anything else is a literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlashPathResolver;

impl PathResolver for SlashPathResolver {
    fn resolve(&self, expr: &str) -> Result<Path, ParseError> {
        parse_path(expr)
    }
}

impl<F> PathResolver for F
where
    F: Fn(&str) -> Result<Path, ParseError> + Send + Sync,
{
    fn resolve(&self, expr: &str) -> Result<Path, ParseError> {
        self(expr)
    }
}

/// Parse a `/`-separated path expression with the default grammar.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid path expression.
pub fn parse_path(input: &str) -> Result<Path, ParseError> {
    use winnow::Parser;
    grammar::path.parse(input).map(Path::new).map_err(|e| {
        let expected = e.inner().to_string();
        let message = if expected.is_empty() {
            format!("invalid path expression {input:?}")
        } else {
            format!("{expected} in {input:?}")
        };
        ParseError::new(message).at(e.offset())
    })
}
