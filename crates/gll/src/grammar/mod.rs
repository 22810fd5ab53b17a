//! # Grammar Module
//!
//! Grammars are written as BNF rules with [`GrammarBuilder`] and compiled to
//! a [`GrammarGraph`]: one [`HeadSlot`] per nonterminal and one [`BodySlot`]
//! per position in each alternative. The graph is what the parser executes.
//!
//! Compilation also pre-builds lookahead tests. Nullable, FIRST and FOLLOW
//! sets are computed once and turned into a [`PredictionTest`] per
//! nonterminal and a [`FollowTest`] per slot.
//!
//! ## Usage
//!
//! ```rust
//! use gll::grammar::{Alternative, Condition, GrammarBuilder, Symbol};
//! use gll::regex::Pattern;
//!
//! // Id ::= [a-z]+ !>> [a-z]
//! let grammar = GrammarBuilder::new()
//!     .rule(
//!         "Id",
//!         [Symbol::terminal(Pattern::range('a', 'z').plus())
//!             .post(Condition::NotFollow(Pattern::range('a', 'z')))],
//!     )
//!     .alternative("Opt", Alternative::empty())
//!     .build()?;
//! assert_eq!(grammar.heads().len(), 2);
//! # Ok::<(), gll::GrammarError>(())
//! ```

mod builder;
mod condition;
mod sets;
mod slot;

pub use builder::{Alternative, GrammarBuilder, Symbol, SymbolKind};
pub use condition::{CompiledCondition, Condition};
pub(crate) use condition::all_hold;
pub use slot::{
    BodySlot, GrammarGraph, HeadId, HeadSlot, NodeKind, SlotId, SlotKind, Terminal, TerminalId,
};
pub use test::{Admitted, DENSE_RANGE_LIMIT, FollowTest, LookaheadSet, PredictionTest};
