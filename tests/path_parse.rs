
use pathrules::{parse_path, PathSegment};
use proptest::prelude::*;
use strategies::arb_path_expr;

fn segments(input: &str) -> Vec<PathSegment> {
    parse_path(input).unwrap().into_segments()
}

#[test]
fn parse_nested_literals() {
    let path = parse_path("a/b/c").unwrap();
    assert_eq!(path.len(), 3);
    assert_eq!(path.to_string(), "/a/b/c");
}

#[test]
fn parse_mixed_segments() {
    let path = parse_path("/rooms/$room/members/$uid").unwrap();
    assert_eq!(path.to_string(), "/rooms/$room/members/$uid");
    assert_eq!(path.variables().collect::<Vec<_>>(), vec!["room", "uid"]);
}

#[test]
fn parse_root_is_empty_path() {
    assert!(parse_path("").unwrap().is_root());
    assert!(parse_path("/").unwrap().is_root());
}

#[test]
fn slash_normalization() {
    assert_eq!(segments("a//b/"), segments("/a/b"));
}

#[test]
fn variable_names_are_kept() {
    let parsed = segments("$uid");
    assert!(matches!(&parsed[..], [PathSegment::Variable(name)] if name == "uid"));
}

#[test]
fn error_bare_dollar() {
    let err = parse_path("users/$").unwrap_err();
    assert!(err.to_string().starts_with("parse error:"), "got: {err}");
}

#[test]
fn error_whitespace() {
    assert!(parse_path("users /x").is_err());
    assert!(parse_path("a b").is_err());
}

#[test]
fn error_dollar_mid_segment() {
    assert!(parse_path("a$b").is_err());
}

#[test]
fn error_names_the_expression() {
    let err = parse_path("a b").unwrap_err();
    assert!(err.message().contains("\"a b\""), "got: {err}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn rendered_paths_parse_back((text, expected) in arb_path_expr()) {
        let parsed = parse_path(&text).unwrap();
        prop_assert_eq!(parsed.segments(), &expected[..]);
        prop_assert_eq!(parsed.to_string(), format!("/{text}"));
    }
}
