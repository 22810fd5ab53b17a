//! End-to-end tests for the GLL parser

use gll::grammar::{Alternative, GrammarBuilder, Symbol};
use gll::sppf::{NodeId, SppfNode};
use gll::{
    Forest, GllError, GllParser, Input, ParseResult, ParserConfig, Resource, Scheduling,
    count_trees, yield_of,
};
use std::sync::Arc;

/// Route parser tracing into the test output; filter with `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn parse(builder: GrammarBuilder, start: &str, text: &str) -> ParseResult {
    init_tracing();
    GllParser::new(builder.build().unwrap())
        .parse(&Input::new(text), start)
        .unwrap()
}

fn round_trip_grammar() -> GrammarBuilder {
    GrammarBuilder::new()
        .rule("A", [Symbol::nt("B"), Symbol::char('a')])
        .rule("B", [Symbol::char('b')])
}

fn extents(forest: &Forest, id: NodeId) -> (usize, usize) {
    (forest.left_extent(id), forest.right_extent(id))
}

#[test]
fn test_round_trip_forest_structure() {
    let result = parse(round_trip_grammar(), "A", "ba");
    let (root, forest) = result.forest().unwrap();
    assert_eq!(forest.label(root), "A");
    assert_eq!(extents(forest, root), (0, 2));

    let root_packed: Vec<_> = forest.packed_children(root).collect();
    assert_eq!(root_packed.len(), 1);
    assert_eq!(root_packed[0].right, None);
    let intermediate = root_packed[0].left;
    assert!(matches!(forest[intermediate], SppfNode::Intermediate { .. }));
    assert_eq!(forest.label(intermediate), "A ::= B 'a' .");
    assert_eq!(extents(forest, intermediate), (0, 2));

    let packed: Vec<_> = forest.packed_children(intermediate).collect();
    assert_eq!(packed.len(), 1);
    assert_eq!(packed[0].pivot, 1);
    let b = packed[0].left;
    let a = packed[0].right.unwrap();
    assert_eq!(forest.label(b), "B");
    assert_eq!(extents(forest, b), (0, 1));
    assert_eq!(forest.label(a), "'a'");
    assert_eq!(extents(forest, a), (1, 2));

    let b_packed: Vec<_> = forest.packed_children(b).collect();
    assert_eq!(b_packed.len(), 1);
    assert_eq!(forest.label(b_packed[0].left), "'b'");
    assert_eq!(extents(forest, b_packed[0].left), (0, 1));
}

#[test]
fn test_round_trip_statistics() {
    let stats = parse(round_trip_grammar(), "A", "ba").statistics();
    assert_eq!(stats.descriptors, 3);
    assert_eq!(stats.gss_nodes, 2);
    assert_eq!(stats.gss_edges, 1);
    assert_eq!(stats.nonterminal_nodes, 2);
    assert_eq!(stats.terminal_nodes, 2);
    assert_eq!(stats.intermediate_nodes, 1);
    assert_eq!(stats.packed_nodes, 3);
    assert_eq!(stats.ambiguous_nodes, 0);
}

#[test]
fn test_single_nonterminal_chain_statistics() {
    let result = parse(
        GrammarBuilder::new()
            .rule("A", [Symbol::nt("B")])
            .rule("B", [Symbol::char('b')]),
        "A",
        "b",
    );
    assert!(result.is_success());
    let stats = result.statistics();
    assert_eq!(stats.descriptors, 3);
    assert_eq!(stats.gss_nodes, 2);
    assert_eq!(stats.gss_edges, 1);
    assert_eq!(stats.nonterminal_nodes, 2);
    assert_eq!(stats.terminal_nodes, 1);
    assert_eq!(stats.intermediate_nodes, 0);
    assert_eq!(stats.packed_nodes, 2);
}

#[test]
fn test_ambiguous_alternatives_share_one_node() {
    let result = parse(
        GrammarBuilder::new()
            .rule("S", [Symbol::nt("A")])
            .rule("S", [Symbol::nt("B")])
            .rule("A", [Symbol::char('s')])
            .rule("B", [Symbol::char('s')]),
        "S",
        "s",
    );
    let success = result.success().unwrap();
    let forest = &success.forest;
    assert_eq!(forest.counts().nonterminal, 3);
    assert!(forest.is_ambiguous(success.root));
    assert_eq!(forest.packed_children(success.root).count(), 2);
    assert_eq!(success.statistics.ambiguous_nodes, 1);
    assert_eq!(count_trees(forest, success.root), Some(2));
}

#[test]
fn test_failure_reports_furthest_position() {
    let result = parse(GrammarBuilder::new().rule("A", [Symbol::char('a')]), "A", "b");
    let failure = result.failure().unwrap();
    assert_eq!(failure.position, 0);
    assert!(failure.active_slots.iter().any(|label| label == "A"));
}

#[test]
fn test_failure_after_partial_match() {
    let result = parse(
        GrammarBuilder::new().rule("S", [Symbol::char('a'), Symbol::char('b'), Symbol::char('c')]),
        "S",
        "abx",
    );
    let failure = result.failure().unwrap();
    assert_eq!(failure.position, 2);
    assert_eq!(failure.active_slots, vec!["S ::= 'a' 'b' . 'c'"]);
}

#[test]
fn test_incomplete_input_fails() {
    let result = parse(round_trip_grammar(), "A", "b");
    assert!(!result.is_success());
    assert_eq!(result.failure().unwrap().position, 1);
}

#[test]
fn test_catalan_many_trees() {
    let builder = GrammarBuilder::new()
        .rule("E", [Symbol::nt("E"), Symbol::nt("E")])
        .rule("E", [Symbol::char('a')]);
    let expected = [(1, 1), (2, 1), (3, 2), (4, 5), (5, 14), (6, 42)];
    for (len, trees) in expected {
        let text = "a".repeat(len);
        let result = parse(builder.clone(), "E", &text);
        let (root, forest) = result.forest().unwrap();
        assert_eq!(count_trees(forest, root), Some(trees), "length {len}");
    }
}

#[test]
fn test_left_recursion() {
    let builder = GrammarBuilder::new()
        .rule("E", [Symbol::nt("E"), Symbol::char('+'), Symbol::char('n')])
        .rule("E", [Symbol::char('n')]);
    let input = Input::new("n+n+n+n");
    let parser = GllParser::new(builder.build().unwrap());
    let result = parser.parse(&input, "E").unwrap();
    let success = result.success().unwrap();
    assert!(!success.is_ambiguous());
    assert_eq!(count_trees(&success.forest, success.root), Some(1));
    assert_eq!(yield_of(&success.forest, success.root, &input, ""), "n+n+n+n");
    assert!(!parser.parse(&Input::new("n+n+"), "E").unwrap().is_success());
}

#[test]
fn test_hidden_left_recursion() {
    let result = parse(
        GrammarBuilder::new()
            .rule("S", [Symbol::nt("N"), Symbol::nt("S"), Symbol::char('b')])
            .rule("S", [Symbol::char('c')])
            .alternative("N", Alternative::empty()),
        "S",
        "cbb",
    );
    let (root, forest) = result.forest().unwrap();
    assert_eq!(count_trees(forest, root), Some(1));
}

#[test]
fn test_nullable_symbols() {
    let builder = GrammarBuilder::new()
        .rule("S", [Symbol::nt("A"), Symbol::nt("A"), Symbol::char('x')])
        .alternative("A", Alternative::empty())
        .rule("A", [Symbol::char('a')]);

    let result = parse(builder.clone(), "S", "ax");
    let (root, forest) = result.forest().unwrap();
    assert_eq!(count_trees(forest, root), Some(2));

    let result = parse(builder.clone(), "S", "x");
    let (root, forest) = result.forest().unwrap();
    assert_eq!(count_trees(forest, root), Some(1));
    assert!(forest.find_terminal(gll::grammar::TerminalId::EPSILON, 0, 0).is_some());

    assert!(parse(builder, "S", "aaax").failure().is_some());
}

#[test]
fn test_empty_input() {
    let builder = GrammarBuilder::new()
        .alternative("S", Alternative::empty())
        .rule("S", [Symbol::char('a'), Symbol::nt("S")]);
    let result = parse(builder.clone(), "S", "");
    let (root, forest) = result.forest().unwrap();
    assert_eq!((forest.left_extent(root), forest.right_extent(root)), (0, 0));
    assert!(parse(builder, "S", "aaa").is_success());
}

#[test]
fn test_multi_codepoint_input() {
    let result = parse(
        GrammarBuilder::new().rule("S", [Symbol::literal("λx"), Symbol::char('→')]),
        "S",
        "λx→",
    );
    let (root, forest) = result.forest().unwrap();
    assert_eq!(forest.right_extent(root), 3);
}

#[test]
fn test_scheduling_does_not_change_the_forest() {
    let builder = GrammarBuilder::new()
        .rule("E", [Symbol::nt("E"), Symbol::char('+'), Symbol::nt("E")])
        .rule("E", [Symbol::nt("E"), Symbol::char('*'), Symbol::nt("E")])
        .rule("E", [Symbol::char('1')]);
    let grammar = Arc::new(builder.build().unwrap());
    let input = Input::new("1+1*1+1");

    let stack = GllParser::with_config(
        Arc::clone(&grammar),
        ParserConfig::new().with_scheduling(Scheduling::Stack),
    );
    let queue = GllParser::with_config(grammar, ParserConfig::new().with_scheduling(Scheduling::Queue));
    let a = stack.parse(&input, "E").unwrap();
    let b = queue.parse(&input, "E").unwrap();
    assert_eq!(a.statistics(), b.statistics());
    let (ra, fa) = a.forest().unwrap();
    let (rb, fb) = b.forest().unwrap();
    assert_eq!(count_trees(fa, ra), Some(5));
    assert_eq!(count_trees(fb, rb), Some(5));
}

#[test]
fn test_lookahead_only_prunes() {
    let builder = GrammarBuilder::new()
        .rule("S", [Symbol::nt("A"), Symbol::char('c')])
        .rule("S", [Symbol::nt("B"), Symbol::char('d')])
        .rule("A", [Symbol::char('a'), Symbol::nt("A")])
        .rule("A", [Symbol::char('a')])
        .rule("B", [Symbol::char('a'), Symbol::nt("B")])
        .rule("B", [Symbol::char('b')]);
    let grammar = Arc::new(builder.build().unwrap());
    let with = GllParser::new(Arc::clone(&grammar));
    let without = GllParser::with_config(grammar, ParserConfig::new().with_lookahead(false));

    for text in ["aaac", "aabd", "aaad", "c", "bd"] {
        let input = Input::new(text);
        let a = with.parse(&input, "S").unwrap();
        let b = without.parse(&input, "S").unwrap();
        assert_eq!(a.is_success(), b.is_success(), "{text}");
        assert!(a.statistics().descriptors <= b.statistics().descriptors, "{text}");
    }
}

#[test]
fn test_descriptor_limit_aborts() {
    init_tracing();
    let grammar = GrammarBuilder::new()
        .rule("E", [Symbol::nt("E"), Symbol::nt("E")])
        .rule("E", [Symbol::char('a')])
        .build()
        .unwrap();
    let parser = GllParser::with_config(grammar, ParserConfig::new().with_max_descriptors(Some(10)));
    let err = parser.parse(&Input::new("aaaaaaaa"), "E").unwrap_err();
    assert_eq!(
        err,
        GllError::ResourceExhausted {
            resource: Resource::Descriptors,
            limit: 10
        }
    );
}

#[test]
fn test_gss_and_sppf_limits_abort() {
    let grammar = Arc::new(round_trip_grammar().build().unwrap());
    let input = Input::new("ba");

    let parser = GllParser::with_config(Arc::clone(&grammar), ParserConfig::new().with_max_gss_nodes(Some(1)));
    assert!(matches!(
        parser.parse(&input, "A"),
        Err(GllError::ResourceExhausted {
            resource: Resource::GssNodes,
            ..
        })
    ));

    let parser = GllParser::with_config(Arc::clone(&grammar), ParserConfig::new().with_max_sppf_nodes(Some(2)));
    assert!(matches!(
        parser.parse(&input, "A"),
        Err(GllError::ResourceExhausted {
            resource: Resource::SppfNodes,
            ..
        })
    ));

    let parser = GllParser::with_config(grammar, ParserConfig::new().with_max_sppf_nodes(Some(5)));
    assert!(parser.parse(&input, "A").unwrap().is_success());
}
