
use pathrules::{merge_rules, prune_empty, Compiler, RuleNode};
use proptest::prelude::*;
use strategies::{arb_directives, arb_path, arb_tree};

// ---------------------------------------------------------------------------
// Merge is an idempotent set union
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn merge_is_idempotent(
        target in arb_tree(),
        addition in arb_tree(),
        path in arb_path(3),
    ) {
        let once = merge_rules(Some(&target), &path, &addition);
        let twice = merge_rules(Some(&once), &path, &addition);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_at_root_is_commutative(a in arb_tree(), b in arb_tree()) {
        let ab = merge_rules(Some(&a), &[], &b);
        let ba = merge_rules(Some(&b), &[], &a);
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn merge_never_loses_predicates(
        target in arb_tree(),
        addition in arb_tree(),
        path in arb_path(3),
    ) {
        let merged = merge_rules(Some(&target), &path, &addition);
        prop_assert!(merged.predicate_count() >= target.predicate_count());
        prop_assert!(merged.predicate_count() >= addition.predicate_count());
        prop_assert!(
            merged.predicate_count() <= target.predicate_count() + addition.predicate_count()
        );
    }

    #[test]
    fn merge_into_absent_target_relocates_addition(
        addition in arb_tree(),
        path in arb_path(3),
    ) {
        let merged = merge_rules(None, &path, &addition);
        let at_path = merged.get(&path);
        prop_assert_eq!(at_path, Some(&addition));
    }

    #[test]
    fn merge_leaves_inputs_untouched(
        target in arb_tree(),
        addition in arb_tree(),
        path in arb_path(3),
    ) {
        let target_before = target.clone();
        let addition_before = addition.clone();
        let _ = merge_rules(Some(&target), &path, &addition);
        prop_assert_eq!(target, target_before);
        prop_assert_eq!(addition, addition_before);
    }
}

// ---------------------------------------------------------------------------
// Merging at a path only rebuilds that path
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn siblings_of_merge_path_are_unchanged(
        target in arb_tree(),
        addition in arb_tree(),
        path in arb_path(3),
    ) {
        prop_assume!(!path.is_empty());
        let merged = merge_rules(Some(&target), &path, &addition);

        prop_assert_eq!(merged.rules(), target.rules());
        for (segment, child) in target.children() {
            if segment != &path[0] {
                prop_assert_eq!(merged.child(segment), Some(child));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

fn has_empty_non_root(node: &RuleNode) -> bool {
    node.rules().values().any(|set| set.is_empty())
        || node
            .children()
            .values()
            .any(|child| child.is_empty() || has_empty_non_root(child))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prune_never_grows_tree(tree in arb_tree()) {
        let pruned = prune_empty(tree.clone());
        prop_assert!(pruned.len() <= tree.len());
        prop_assert_eq!(pruned.predicate_count(), tree.predicate_count());
        prop_assert_eq!(pruned.paths(), tree.paths());
    }

    #[test]
    fn prune_removes_every_empty_subtree(tree in arb_tree()) {
        let pruned = prune_empty(tree);
        prop_assert!(!has_empty_non_root(&pruned));
    }

    #[test]
    fn prune_is_idempotent(tree in arb_tree()) {
        let once = prune_empty(tree);
        let twice = prune_empty(once.clone());
        prop_assert_eq!(once, twice);
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn well_formed_directives_compile_completely(directives in arb_directives()) {
        let mut compiler = Compiler::new();
        let compilation = compiler.compile_body(directives);
        prop_assert!(compilation.is_complete());
        prop_assert!(!has_empty_non_root(compilation.tree()));
    }

    #[test]
    fn compilation_is_deterministic(directives in arb_directives()) {
        let first = Compiler::new().compile_body(directives.clone()).into_tree();
        let second = Compiler::new().compile_body(directives).into_tree();
        prop_assert_eq!(first.to_string(), second.to_string());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn authorizing_twice_matches_once(directives in arb_directives()) {
        let once = Compiler::new().compile_body(directives.clone()).into_tree();
        let twice = Compiler::new()
            .compile(|root| {
                root.authorize(directives.clone())?;
                root.authorize(directives)
            })
            .into_tree();
        prop_assert_eq!(once, twice);
    }
}
