#![no_main]
use gll::grammar::{Alternative, Condition, GrammarBuilder, Symbol};
use gll::regex::Pattern;
use gll::{GllParser, Input, ParserConfig, Scheduling, count_trees};
use libfuzzer_sys::fuzz_target;
use std::sync::{Arc, OnceLock};

fn grammar() -> Arc<gll::GrammarGraph> {
    static GRAMMAR: OnceLock<Arc<gll::GrammarGraph>> = OnceLock::new();
    Arc::clone(GRAMMAR.get_or_init(|| {
        // E ::= E '+' E | E E | '(' E ')' | Id | ε ;  Id ::= [a-z]+ !>> [a-z]
        let letters = Pattern::range('a', 'z');
        let grammar = GrammarBuilder::new()
            .rule("E", [Symbol::nt("E"), Symbol::char('+'), Symbol::nt("E")])
            .rule("E", [Symbol::nt("E"), Symbol::nt("E")])
            .rule("E", [Symbol::char('('), Symbol::nt("E"), Symbol::char(')')])
            .rule("E", [Symbol::nt("Id")])
            .alternative("E", Alternative::empty())
            .rule(
                "Id",
                [Symbol::terminal(letters.clone().plus()).post(Condition::NotFollow(letters))],
            )
            .build();
        match grammar {
            Ok(grammar) => Arc::new(grammar),
            Err(err) => panic!("fuzz grammar is invalid: {err}"),
        }
    }))
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.chars().count() > 32 {
        return;
    }
    let input = Input::new(text);

    let stack = GllParser::with_config(
        grammar(),
        ParserConfig::new().with_max_descriptors(Some(200_000)),
    );
    let queue = GllParser::with_config(
        grammar(),
        ParserConfig::new()
            .with_scheduling(Scheduling::Queue)
            .with_lookahead(false)
            .with_max_descriptors(Some(200_000)),
    );

    let (Ok(a), Ok(b)) = (stack.parse(&input, "E"), queue.parse(&input, "E")) else {
        return;
    };
    assert_eq!(a.is_success(), b.is_success());
    if let (Some((ra, fa)), Some((rb, fb))) = (a.forest(), b.forest()) {
        assert_eq!(count_trees(fa, ra), count_trees(fb, rb));
    }
});
