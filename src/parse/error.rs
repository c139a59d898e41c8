use thiserror::Error;

/// A path expression that could not be resolved into segments.
///
/// Carries the byte offset into the expression where resolution stopped,
/// when the resolver knows it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    message: String,
    offset: Option<usize>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
        }
    }

    /// Attach the byte offset at which the expression was rejected.
    #[must_use]
    pub fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }
}
