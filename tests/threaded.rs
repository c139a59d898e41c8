use std::sync::Arc;
use std::thread;

use pathrules::{merge_rules, Compiler, PathSegment, RuleCategory, RuleNode};

fn section(name: &'static str, predicate: &'static str) -> RuleNode {
    Compiler::new()
        .compile(move |root| {
            root.at(&format!("{name}/$id"), |s| {
                s.add(RuleCategory::Read, predicate);
                Ok(())
            });
            Ok(())
        })
        .into_tree()
}

#[test]
fn compile_sections_on_separate_threads() {
    let sections = [
        ("users", "auth.uid == $id"),
        ("rooms", "auth != null"),
        ("messages", "root.child('rooms').hasChild($id)"),
        ("admins", "false"),
    ];

    let handles: Vec<_> = sections
        .iter()
        .map(|&(name, predicate)| thread::spawn(move || section(name, predicate)))
        .collect();

    let combined = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .fold(RuleNode::new(), |acc, part| merge_rules(Some(&acc), &[], &part));

    let sequential = sections
        .iter()
        .map(|&(name, predicate)| section(name, predicate))
        .fold(RuleNode::new(), |acc, part| merge_rules(Some(&acc), &[], &part));

    assert_eq!(combined, sequential);
    assert_eq!(combined.children().len(), 4);
    assert_eq!(combined.predicate_count(), 4);
}

#[test]
fn shared_tree_is_readable_across_threads() {
    let tree = Arc::new(section("users", "auth.uid == $id"));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                tree.get(&[PathSegment::literal("users"), PathSegment::variable("id")])
                    .and_then(|node| node.predicates(RuleCategory::Read))
                    .map(|set| set.len())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Some(1));
    }
}

#[test]
fn compiler_can_move_between_threads() {
    let mut compiler = Compiler::new();
    let first = compiler
        .at("a", |s| {
            s.add(RuleCategory::Read, "p");
            Ok(())
        })
        .unwrap();

    let handle = thread::spawn(move || {
        let second = compiler.at("b", |s| {
            s.add(RuleCategory::Write, "q");
            Ok(())
        });
        (compiler.diagnostics().len(), second)
    });
    let (diagnostics, second) = handle.join().unwrap();

    assert_eq!(diagnostics, 0);
    assert!(first.child(&PathSegment::literal("a")).is_some());
    assert!(second.unwrap().child(&PathSegment::literal("b")).is_some());
}
