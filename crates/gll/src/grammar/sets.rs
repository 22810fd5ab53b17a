//! Nullable, FIRST and FOLLOW sets, used only to pre-build lookahead tests.

use super::slot::{HeadId, TerminalId};
use super::test::LookaheadSet;
use crate::regex::Pattern;

/// A grammar symbol reduced to what set computation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SymbolRef {
    Terminal(TerminalId),
    Nonterminal(HeadId),
}

/// Alternatives of each head, indexed by `HeadId`.
pub(crate) type Productions = [Vec<Vec<SymbolRef>>];

#[derive(Debug)]
pub(crate) struct GrammarSets {
    pub nullable: Vec<bool>,
    pub first: Vec<LookaheadSet>,
    pub follow: Vec<LookaheadSet>,
    terminal_first: Vec<LookaheadSet>,
    terminal_nullable: Vec<bool>,
}

impl GrammarSets {
    /// Compute all sets by fixed-point iteration.
    ///
    /// Every head's FOLLOW contains EOF, since any nonterminal may be used
    /// as the start symbol of a parse.
    pub fn compute(productions: &Productions, terminals: &[Pattern]) -> Self {
        let mut sets = Self {
            nullable: vec![false; productions.len()],
            first: vec![LookaheadSet::default(); productions.len()],
            follow: vec![LookaheadSet::eof(); productions.len()],
            terminal_first: terminals
                .iter()
                .map(|p| LookaheadSet::new(p.first_set(), false))
                .collect(),
            terminal_nullable: terminals.iter().map(Pattern::is_nullable).collect(),
        };

        let mut changed = true;
        while changed {
            changed = false;
            for (head, alternatives) in productions.iter().enumerate() {
                for alternative in alternatives {
                    let (first, nullable) = sets.first_of(alternative);
                    changed |= sets.first[head].union_with(&first);
                    if nullable && !sets.nullable[head] {
                        sets.nullable[head] = true;
                        changed = true;
                    }
                }
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for (head, alternatives) in productions.iter().enumerate() {
                for alternative in alternatives {
                    for (i, symbol) in alternative.iter().enumerate() {
                        let SymbolRef::Nonterminal(callee) = *symbol else {
                            continue;
                        };
                        let (mut rest, nullable) = sets.first_of(&alternative[i + 1..]);
                        if nullable {
                            rest.union_with(&sets.follow[head]);
                        }
                        changed |= sets.follow[callee.index()].union_with(&rest);
                    }
                }
            }
        }

        sets
    }

    /// FIRST of a symbol sequence and whether the sequence is nullable.
    pub fn first_of(&self, symbols: &[SymbolRef]) -> (LookaheadSet, bool) {
        let mut first = LookaheadSet::default();
        for symbol in symbols {
            let nullable = match *symbol {
                SymbolRef::Terminal(t) => {
                    first.union_with(&self.terminal_first[t.index()]);
                    self.terminal_nullable[t.index()]
                }
                SymbolRef::Nonterminal(h) => {
                    first.union_with(&self.first[h.index()]);
                    self.nullable[h.index()]
                }
            };
            if !nullable {
                return (first, false);
            }
        }
        (first, true)
    }

    /// Lookahead that may appear at a point followed by `rest` in an
    /// alternative of `head`.
    pub fn follow_of(&self, head: HeadId, rest: &[SymbolRef]) -> LookaheadSet {
        let (mut set, nullable) = self.first_of(rest);
        if nullable {
            set.union_with(&self.follow[head.index()]);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: HeadId = HeadId(0);
    const B: HeadId = HeadId(1);

    #[test]
    fn test_nullable_propagates() {
        // A ::= B 'a' | B ;  B ::= 'b' | ε
        let productions = vec![
            vec![
                vec![SymbolRef::Nonterminal(B), SymbolRef::Terminal(TerminalId(0))],
                vec![SymbolRef::Nonterminal(B)],
            ],
            vec![vec![SymbolRef::Terminal(TerminalId(1))], vec![]],
        ];
        let terminals = [Pattern::Char('a'), Pattern::Char('b')];
        let sets = GrammarSets::compute(&productions, &terminals);

        assert!(sets.nullable[0]);
        assert!(sets.nullable[1]);
        assert!(sets.first[0].contains('a' as i32));
        assert!(sets.first[0].contains('b' as i32));
        assert!(!sets.first[1].contains('a' as i32));
        assert!(sets.follow[1].contains('a' as i32));
        assert!(sets.follow[1].contains(crate::input::EOF));
    }

    #[test]
    fn test_left_recursion_terminates() {
        // A ::= A 'a' | 'a'
        let productions = vec![vec![
            vec![SymbolRef::Nonterminal(A), SymbolRef::Terminal(TerminalId(0))],
            vec![SymbolRef::Terminal(TerminalId(0))],
        ]];
        let sets = GrammarSets::compute(&productions, &[Pattern::Char('a')]);
        assert!(!sets.nullable[0]);
        assert!(sets.first[0].contains('a' as i32));
        assert!(sets.follow[0].contains('a' as i32));
    }
}
