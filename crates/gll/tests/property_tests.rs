//! Property-based tests for the GLL parser
//!
//! These tests use proptest to generate random inputs and check properties
//! that must hold for every input: the descriptor processing order and the
//! lookahead tests never change what is recognized, and every parse
//! terminates within the configured resource bounds.

#![cfg(test)]

use gll::grammar::{Alternative, GrammarBuilder, GrammarGraph, Symbol};
use gll::{GllParser, Input, Limits, ParseResult, ParserConfig, Scheduling, count_trees};
use proptest::prelude::*;
use std::sync::Arc;

/// E ::= E '+' E | E E | '(' E ')' | 'a' | ε
fn ambiguous_grammar() -> Arc<GrammarGraph> {
    Arc::new(
        GrammarBuilder::new()
            .rule("E", [Symbol::nt("E"), Symbol::char('+'), Symbol::nt("E")])
            .rule("E", [Symbol::nt("E"), Symbol::nt("E")])
            .rule("E", [Symbol::char('('), Symbol::nt("E"), Symbol::char(')')])
            .rule("E", [Symbol::char('a')])
            .alternative("E", Alternative::empty())
            .build()
            .unwrap(),
    )
}

/// S ::= S '+' T | T ;  T ::= 'a' | '(' S ')'
fn unambiguous_grammar() -> Arc<GrammarGraph> {
    Arc::new(
        GrammarBuilder::new()
            .rule("S", [Symbol::nt("S"), Symbol::char('+'), Symbol::nt("T")])
            .rule("S", [Symbol::nt("T")])
            .rule("T", [Symbol::char('a')])
            .rule("T", [Symbol::char('('), Symbol::nt("S"), Symbol::char(')')])
            .build()
            .unwrap(),
    )
}

fn input_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('a'), Just('+'), Just('('), Just(')')], 0..8)
        .prop_map(|chars| chars.into_iter().collect())
}

fn parse(grammar: &Arc<GrammarGraph>, config: ParserConfig, start: &str, text: &str) -> ParseResult {
    GllParser::with_config(Arc::clone(grammar), config)
        .parse(&Input::new(text), start)
        .unwrap()
}

proptest! {
    #[test]
    fn stack_and_queue_reach_the_same_fixpoint(text in input_strategy()) {
        let grammar = unambiguous_grammar();
        let stack = parse(&grammar, ParserConfig::new().with_scheduling(Scheduling::Stack), "S", &text);
        let queue = parse(&grammar, ParserConfig::new().with_scheduling(Scheduling::Queue), "S", &text);
        prop_assert_eq!(stack.is_success(), queue.is_success());
        prop_assert_eq!(stack.statistics(), queue.statistics());
        if let (Some((ra, fa)), Some((rb, fb))) = (stack.forest(), queue.forest()) {
            prop_assert_eq!(count_trees(fa, ra), count_trees(fb, rb));
        }
    }

    #[test]
    fn ambiguous_grammar_is_order_independent(text in input_strategy()) {
        let grammar = ambiguous_grammar();
        let stack = parse(&grammar, ParserConfig::new().with_scheduling(Scheduling::Stack), "E", &text);
        let queue = parse(&grammar, ParserConfig::new().with_scheduling(Scheduling::Queue), "E", &text);
        prop_assert_eq!(stack.is_success(), queue.is_success());
        prop_assert_eq!(stack.statistics(), queue.statistics());
    }

    #[test]
    fn lookahead_never_changes_the_verdict(text in input_strategy()) {
        let grammar = unambiguous_grammar();
        let with = parse(&grammar, ParserConfig::new(), "S", &text);
        let without = parse(&grammar, ParserConfig::new().with_lookahead(false), "S", &text);
        prop_assert_eq!(with.is_success(), without.is_success());
        if let (Some((ra, fa)), Some((rb, fb))) = (with.forest(), without.forest()) {
            prop_assert_eq!(count_trees(fa, ra), Some(1));
            prop_assert_eq!(count_trees(fb, rb), Some(1));
        }
    }

    #[test]
    fn parses_terminate_within_cubic_bounds(text in input_strategy()) {
        let grammar = ambiguous_grammar();
        let n = text.chars().count() + 1;
        let slots = grammar.slots().len();
        let heads = grammar.heads().len();
        let limits = Limits {
            max_descriptors: Some(slots * heads * n * n * 2),
            max_gss_nodes: Some(heads * n),
            max_sppf_nodes: Some((slots + heads) * (slots + 1) * n * n * n),
        };
        let result = GllParser::with_config(Arc::clone(&grammar), ParserConfig::new().with_limits(limits))
            .parse(&Input::new(&text), "E");
        prop_assert!(result.is_ok());
    }

    #[test]
    fn balanced_inputs_are_recognized(depth in 0usize..5, items in 1usize..4) {
        let inner = vec!["a"; items].join("+");
        let text = format!("{}{}{}", "(".repeat(depth), inner, ")".repeat(depth));
        let result = parse(&unambiguous_grammar(), ParserConfig::new(), "S", &text);
        prop_assert!(result.is_success());
    }
}
