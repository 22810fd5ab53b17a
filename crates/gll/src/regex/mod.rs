//! Regular patterns and the automata that match them.
//!
//! Patterns are compiled once, at grammar construction, into deterministic
//! automata. The parser only sees them through [`Matcher`], which reports the
//! longest match length anchored at a position. Preceded-by conditions use a
//! [`BackwardsMatcher`] built from the reversed pattern.

mod automaton;
mod matcher;
mod pattern;

pub use automaton::{Dfa, StateId};
pub use matcher::{BackwardsMatcher, DfaMatcher, Matcher};
pub use pattern::{CharSet, Pattern};
