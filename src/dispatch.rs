use crate::{
    CompileError, DirectiveValue, Directives, DispatchPolicy, PathSegment, RuleCategory, Scope,
};

/// Run each directive entry against `scope`.
///
/// Category tags add their predicate to the scope. Every other tag is one
/// child segment, never re-parsed as a path expression: its value becomes the
/// body of a nested scope, so a failure inside it is contained there. A value of the wrong shape for its tag fails the whole
/// mapping, and with it the scope that is dispatching it.
pub(crate) fn dispatch(scope: &mut Scope<'_>, directives: Directives) -> Result<(), CompileError> {
    let policy = scope.dispatch_policy();
    for (tag, value) in directives {
        match (classify(&tag, policy)?, value) {
            (Some(category), DirectiveValue::Predicate(predicate)) => {
                scope.add(category, predicate);
            }
            (Some(_), _) => return Err(CompileError::ExpectedPredicate { tag }),
            (None, DirectiveValue::Predicate(_)) => {
                return Err(CompileError::ExpectedBody { tag });
            }
            (None, DirectiveValue::Nested(nested)) => {
                scope.descend(PathSegment::from_tag(&tag), nested);
            }
            (None, DirectiveValue::Body(body)) => {
                scope.descend(PathSegment::from_tag(&tag), body);
            }
        }
    }
    Ok(())
}

fn classify(tag: &str, policy: DispatchPolicy) -> Result<Option<RuleCategory>, CompileError> {
    if let Some(category) = RuleCategory::from_tag(tag) {
        return Ok(Some(category));
    }
    if policy == DispatchPolicy::Strict {
        if let Some(category) = RuleCategory::from_tag_ignore_case(tag) {
            return Err(CompileError::CategoryCollision {
                tag: tag.to_owned(),
                category,
            });
        }
    }
    Ok(None)
}
