use super::automaton::Dfa;
use super::pattern::Pattern;
use crate::input::Input;
use std::fmt;

/// Anything that can report the length of a match anchored at a position.
///
/// Terminal slots and `follow` conditions match forward from `pos`;
/// `precede` conditions use a [`BackwardsMatcher`], which matches the
/// characters ending just before `pos`.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Length in codepoints of the longest match anchored at `pos`.
    fn match_at(&self, input: &Input, pos: usize) -> Option<usize>;
}

/// Forward matcher backed by a compiled DFA.
#[derive(Clone)]
pub struct DfaMatcher {
    pattern: Pattern,
    dfa: Dfa,
}

impl DfaMatcher {
    #[must_use]
    pub fn new(pattern: &Pattern) -> Self {
        Self {
            pattern: pattern.clone(),
            dfa: Dfa::compile(pattern),
        }
    }

    #[must_use]
    pub const fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Whether exactly the span `[left, right)` is accepted.
    #[must_use]
    pub fn matches_span(&self, input: &Input, left: usize, right: usize) -> bool {
        let chars = input.chars();
        if left > right || right > chars.len() {
            return false;
        }
        self.dfa.accepts(chars[left..right].iter().copied())
    }
}

impl Matcher for DfaMatcher {
    fn match_at(&self, input: &Input, pos: usize) -> Option<usize> {
        let rest = input.chars().get(pos..).unwrap_or(&[]);
        self.dfa.longest_match(rest.iter().copied())
    }
}

impl fmt::Debug for DfaMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DfaMatcher")
            .field("pattern", &format_args!("{}", self.pattern))
            .field("states", &self.dfa.state_count())
            .finish()
    }
}

/// Matches a pattern ending exactly at a position, scanning right to left.
///
/// Compiled from the reversed pattern, so the longest backward match is the
/// longest suffix of `input[..pos]` accepted by the forward pattern.
#[derive(Clone)]
pub struct BackwardsMatcher {
    pattern: Pattern,
    dfa: Dfa,
}

impl BackwardsMatcher {
    #[must_use]
    pub fn new(pattern: &Pattern) -> Self {
        Self {
            pattern: pattern.clone(),
            dfa: Dfa::compile(&pattern.reverse()),
        }
    }
}

impl Matcher for BackwardsMatcher {
    fn match_at(&self, input: &Input, pos: usize) -> Option<usize> {
        if pos == 0 {
            return None;
        }
        let before = input.chars().get(..pos)?;
        self.dfa.longest_match(before.iter().rev().copied())
    }
}

impl fmt::Debug for BackwardsMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackwardsMatcher")
            .field("pattern", &format_args!("{}", self.pattern))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_match_at_offset() {
        let m = DfaMatcher::new(&Pattern::range('a', 'z').plus());
        let input = Input::new("12abc3");
        assert_eq!(m.match_at(&input, 2), Some(3));
        assert_eq!(m.match_at(&input, 0), None);
        assert_eq!(m.match_at(&input, 6), None);
        assert_eq!(m.match_at(&input, 60), None);
    }

    #[test]
    fn test_matches_span_is_exact() {
        let m = DfaMatcher::new(&Pattern::literal("if"));
        let input = Input::new("iffy");
        assert!(m.matches_span(&input, 0, 2));
        assert!(!m.matches_span(&input, 0, 3));
        assert!(!m.matches_span(&input, 3, 2));
    }

    #[test]
    fn test_backwards_longest_suffix() {
        let m = BackwardsMatcher::new(&Pattern::literal("ab"));
        let input = Input::new("xabc");
        assert_eq!(m.match_at(&input, 3), Some(2));
        assert_eq!(m.match_at(&input, 2), None);
        assert_eq!(m.match_at(&input, 4), None);

        let digits = BackwardsMatcher::new(&Pattern::range('0', '9').plus());
        let input = Input::new("a123b");
        assert_eq!(digits.match_at(&input, 4), Some(3));
        assert_eq!(digits.match_at(&input, 2), Some(1));
    }

    #[test]
    fn test_backwards_at_start_never_matches() {
        let m = BackwardsMatcher::new(&Pattern::Char('a').star());
        let input = Input::new("aaa");
        assert_eq!(m.match_at(&input, 0), None);
        assert_eq!(m.match_at(&input, 2), Some(2));
    }
}
