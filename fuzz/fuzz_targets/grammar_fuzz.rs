#![no_main]
use gll::grammar::{Alternative, GrammarBuilder, Symbol};
use gll::{GllParser, Input, ParserConfig};
use libfuzzer_sys::fuzz_target;

const HEADS: [&str; 3] = ["A", "B", "C"];

// Bytes before the first 0xff describe a grammar over heads A, B, C and
// terminals 'a', 'b'; the rest is the input.
fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|&b| b == 0xff).unwrap_or(data.len());
    let (rules, rest) = data.split_at(split);
    let text: String = rest
        .iter()
        .skip(1)
        .map(|b| if b % 2 == 0 { 'a' } else { 'b' })
        .take(16)
        .collect();

    let mut builder = GrammarBuilder::new();
    for rule in rules.chunks(4).take(12) {
        let head = HEADS[usize::from(rule[0]) % HEADS.len()];
        let symbols: Vec<Symbol> = rule[1..]
            .iter()
            .filter_map(|&b| match b % 6 {
                0 => Some(Symbol::char('a')),
                1 => Some(Symbol::char('b')),
                2..=4 => Some(Symbol::nt(HEADS[usize::from(b % 6) - 2])),
                _ => None,
            })
            .collect();
        builder = builder.alternative(head, Alternative::new(symbols));
    }
    let Ok(grammar) = builder.build() else {
        return;
    };

    let parser = GllParser::with_config(grammar, ParserConfig::new().with_max_descriptors(Some(100_000)));
    let _ = parser.parse(&Input::new(&text), "A");
});
