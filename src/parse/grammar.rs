use winnow::combinator::{alt, cut_err, preceded};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::PathSegment;

// -- Segments ---------------------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1, |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn is_literal_char(c: char) -> bool {
    c != '/' && c != '$' && !c.is_whitespace()
}

fn variable(input: &mut &str) -> ModalResult<PathSegment> {
    preceded(
        '$',
        cut_err(ident).context(StrContext::Expected(StrContextValue::Description(
            "variable name",
        ))),
    )
    .map(PathSegment::variable)
    .parse_next(input)
}

fn literal(input: &mut &str) -> ModalResult<PathSegment> {
    take_while(1.., is_literal_char)
        .map(PathSegment::literal)
        .parse_next(input)
}

fn segment(input: &mut &str) -> ModalResult<PathSegment> {
    alt((variable, literal))
        .context(StrContext::Expected(StrContextValue::Description(
            "path segment",
        )))
        .parse_next(input)
}

// -- Separators -------------------------------------------------------------

fn separators(input: &mut &str) -> ModalResult<()> {
    take_while(0.., '/').void().parse_next(input)
}

fn separator(input: &mut &str) -> ModalResult<()> {
    take_while(1.., '/')
        .void()
        .context(StrContext::Expected(StrContextValue::CharLiteral('/')))
        .parse_next(input)
}

// -- Top-level parser -------------------------------------------------------

/// `/`-separated segments. Leading, trailing and repeated slashes are
/// ignored, so `""`, `"/"` and `"//"` all denote the root.
pub fn path(input: &mut &str) -> ModalResult<Vec<PathSegment>> {
    separators.parse_next(input)?;
    let mut segments = Vec::new();
    while !input.is_empty() {
        segments.push(segment.parse_next(input)?);
        if !input.is_empty() {
            cut_err(separator).parse_next(input)?;
        }
    }
    Ok(segments)
}
