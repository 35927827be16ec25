// tests/tree_tests.rs
//
// Trees from grammars with several levels of nested expansion, including
// empty alternatives that leave childless expansion nodes behind.

mod common;

use common::{grammar, parse, row, rows, EXPRESSIONS, G1};
use descent::config::DEFAULT_MAX_TREE_DEPTH;
use descent::{ErrorKind, ParseTree, Parser, ParserConfig, StackEntry};

#[test]
fn test_sum_tree_links() {
    let g = grammar(EXPRESSIONS);
    let outcome = parse(&g, "id + id");
    assert_eq!(
        rows(&outcome),
        [
            row("expr", Some(1), None, None),
            row("term", Some(4), Some(0), Some(5)),
            row("factor", Some(8), Some(1), Some(4)),
            row("id", None, Some(2), None),
            row("term_tail", Some(6), Some(1), None),
            row("expr_tail", Some(2), Some(0), None),
            row("+", None, Some(5), Some(7)),
            row("term", Some(4), Some(5), Some(11)),
            row("factor", Some(8), Some(7), Some(10)),
            row("id", None, Some(8), None),
            row("term_tail", Some(6), Some(7), None),
            row("expr_tail", Some(3), Some(5), None),
        ]
    );
}

#[test]
fn test_parenthesised_tree_links() {
    let g = grammar(EXPRESSIONS);
    let outcome = parse(&g, "( id )");
    assert_eq!(
        rows(&outcome),
        [
            row("expr", Some(1), None, None),
            row("term", Some(4), Some(0), Some(12)),
            row("factor", Some(7), Some(1), Some(11)),
            row("(", None, Some(2), Some(4)),
            row("expr", Some(1), Some(2), Some(10)),
            row("term", Some(4), Some(4), Some(9)),
            row("factor", Some(8), Some(5), Some(8)),
            row("id", None, Some(6), None),
            row("term_tail", Some(6), Some(5), None),
            row("expr_tail", Some(3), Some(4), None),
            row(")", None, Some(2), None),
            row("term_tail", Some(6), Some(1), None),
            row("expr_tail", Some(3), Some(0), None),
        ]
    );
    let tree = outcome.tree().unwrap();
    assert_eq!(tree.depth(7), 6);
    assert_eq!(tree.children(2).collect::<Vec<_>>(), [3, 4, 10]);
}

#[test]
fn test_child_counts_match_production_lengths() {
    let g = grammar(EXPRESSIONS);
    let outcome = parse(&g, "( id * id + id ) * ( id )");
    let tree = outcome.tree().unwrap();

    for (index, node) in tree.nodes().iter().enumerate() {
        let expected = match node.production {
            Some(p) => g.production(p).unwrap().body.len(),
            None => 0,
        };
        assert_eq!(tree.children(index).count(), expected, "node {}", index);
    }
    assert_eq!(
        tree.yield_symbols(),
        ["(", "id", "*", "id", "+", "id", ")", "*", "(", "id", ")"]
    );
}

#[test]
fn test_first_child_follows_preorder() {
    let g = grammar(EXPRESSIONS);
    let outcome = parse(&g, "id");
    let tree = outcome.tree().unwrap();
    assert_eq!(tree.root(), Some(0));
    assert_eq!(tree.first_child(0), Some(1));
    // term_tail took the empty alternative.
    let empty = tree
        .nodes()
        .iter()
        .position(|n| n.symbol == "term_tail")
        .unwrap();
    assert_eq!(tree.first_child(empty), None);
}

#[test]
fn test_outline_and_table() {
    let g = grammar(G1);
    let outcome = parse(&g, "a b b");
    let tree = outcome.tree().unwrap();
    assert_eq!(
        tree.to_string(),
        "S [1]\n├── a\n└── A [2]\n    ├── b\n    └── A [3]\n        └── b"
    );
    let table = tree.render_table();
    let header: Vec<_> = table.lines().next().unwrap().split_whitespace().collect();
    assert_eq!(header, ["index", "symbol", "production", "parent", "sibling"]);
    let last: Vec<_> = table.lines().last().unwrap().split_whitespace().collect();
    assert_eq!(last, ["5", "b", "-", "4", "-"]);
}

#[test]
fn test_tree_serializes_nodes() {
    let g = grammar(G1);
    let outcome = parse(&g, "a b");
    let json = serde_json::to_value(outcome.tree().unwrap()).unwrap();
    assert_eq!(json["nodes"][1]["symbol"], "a");
    assert_eq!(json["nodes"][1]["next_sibling"], 2);
    assert!(json["nodes"][0]["parent"].is_null());
}

#[test]
fn test_rebuild_from_stack_matches_parser_tree() {
    let g = grammar(EXPRESSIONS);
    let outcome = parse(&g, "id * id");
    let derivation = outcome.derivation().unwrap();
    let rebuilt = ParseTree::from_working_stack(&g, &derivation.working_stack, 64);
    assert_eq!(rebuilt.map_err(|e| e.kind), derivation.tree);
}

#[test]
fn test_truncated_stack_is_malformed() {
    let g = grammar(EXPRESSIONS);
    let outcome = parse(&g, "id + id");
    let stack: Vec<StackEntry> = outcome.derivation().unwrap().working_stack.clone();
    let err = ParseTree::from_working_stack(&g, &stack[..stack.len() - 1], 64).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedTrace { .. }));
}

#[test]
fn test_depth_limit_leaves_verdict_accepted() {
    let g = grammar(EXPRESSIONS);
    let config = ParserConfig {
        max_tree_depth: 3,
        ..ParserConfig::default()
    };
    let outcome = Parser::new(&g)
        .with_config(config)
        .parse(&common::tokens("( ( id ) )"))
        .unwrap();
    assert!(outcome.is_accepted());
    assert_eq!(
        outcome.derivation().unwrap().tree,
        Err(ErrorKind::TreeDepthExceeded { limit: 3 })
    );
}

#[test]
fn test_nesting_close_to_default_depth() {
    let g = grammar(G1);
    // The last `b` of `a b^n` sits at depth n + 1.
    let depth = DEFAULT_MAX_TREE_DEPTH - 10;
    let outcome = parse(&g, &format!("a {}", "b ".repeat(depth - 1)));
    let derivation = outcome.derivation().unwrap();
    let tree = derivation.tree.as_ref().unwrap();
    assert_eq!(tree.depth(tree.len() - 1), depth);

    let rebuilt =
        ParseTree::from_working_stack(&g, &derivation.working_stack, DEFAULT_MAX_TREE_DEPTH)
            .unwrap();
    assert_eq!(&rebuilt, tree);

    let err = ParseTree::from_working_stack(&g, &derivation.working_stack, depth - 1).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TreeDepthExceeded { limit: depth - 1 });
}
