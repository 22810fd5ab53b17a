//! Context conditions attached to grammar symbols.
//!
//! A condition is a gate: when it does not hold, the branch being explored is
//! dropped. Pre-conditions run before a symbol is attempted, with both extents
//! at the current position. Post-conditions run after the symbol has been
//! recognized, with its left and right extents.

use crate::env::{Environment, Predicate};
use crate::input::Input;
use crate::regex::{BackwardsMatcher, DfaMatcher, Matcher, Pattern};
use std::fmt;

/// A condition as written in a grammar.
#[derive(Debug, Clone)]
pub enum Condition {
    /// The text ending at the left extent matches.
    Precede(Pattern),
    NotPrecede(Pattern),
    /// The text starting at the right extent matches.
    Follow(Pattern),
    NotFollow(Pattern),
    /// The text `[left, right)` matches exactly.
    Match(Pattern),
    NotMatch(Pattern),
    StartOfLine,
    EndOfLine,
    EndOfFile,
    Predicate(Predicate),
}

impl Condition {
    #[must_use]
    pub fn predicate(
        name: &str,
        test: impl Fn(&Environment, &Input) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::Predicate(Predicate::new(name, test))
    }

    pub(crate) fn pattern(&self) -> Option<&Pattern> {
        match self {
            Self::Precede(p)
            | Self::NotPrecede(p)
            | Self::Follow(p)
            | Self::NotFollow(p)
            | Self::Match(p)
            | Self::NotMatch(p) => Some(p),
            _ => None,
        }
    }

    pub(crate) fn compile(&self) -> CompiledCondition {
        match self {
            Self::Precede(p) => CompiledCondition::Precede {
                negated: false,
                matcher: BackwardsMatcher::new(p),
            },
            Self::NotPrecede(p) => CompiledCondition::Precede {
                negated: true,
                matcher: BackwardsMatcher::new(p),
            },
            Self::Follow(p) => CompiledCondition::Follow {
                negated: false,
                matcher: DfaMatcher::new(p),
            },
            Self::NotFollow(p) => CompiledCondition::Follow {
                negated: true,
                matcher: DfaMatcher::new(p),
            },
            Self::Match(p) => CompiledCondition::Match {
                negated: false,
                matcher: DfaMatcher::new(p),
            },
            Self::NotMatch(p) => CompiledCondition::Match {
                negated: true,
                matcher: DfaMatcher::new(p),
            },
            Self::StartOfLine => CompiledCondition::StartOfLine,
            Self::EndOfLine => CompiledCondition::EndOfLine,
            Self::EndOfFile => CompiledCondition::EndOfFile,
            Self::Predicate(p) => CompiledCondition::Predicate(p.clone()),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precede(p) => write!(f, "{p} <<"),
            Self::NotPrecede(p) => write!(f, "{p} !<<"),
            Self::Follow(p) => write!(f, ">> {p}"),
            Self::NotFollow(p) => write!(f, "!>> {p}"),
            Self::Match(p) => write!(f, "& {p}"),
            Self::NotMatch(p) => write!(f, "\\ {p}"),
            Self::StartOfLine => write!(f, "^"),
            Self::EndOfLine => write!(f, "$"),
            Self::EndOfFile => write!(f, "$$"),
            Self::Predicate(p) => write!(f, "[{}]", p.name()),
        }
    }
}

/// A condition with its patterns compiled to matchers.
#[derive(Debug, Clone)]
pub enum CompiledCondition {
    Precede {
        negated: bool,
        matcher: BackwardsMatcher,
    },
    Follow {
        negated: bool,
        matcher: DfaMatcher,
    },
    Match {
        negated: bool,
        matcher: DfaMatcher,
    },
    StartOfLine,
    EndOfLine,
    EndOfFile,
    Predicate(Predicate),
}

impl CompiledCondition {
    /// Evaluate against a symbol spanning `[left, right)`.
    #[must_use]
    pub fn holds(&self, input: &Input, left: usize, right: usize, env: &Environment) -> bool {
        match self {
            Self::Precede { negated, matcher } => matcher.match_at(input, left).is_some() != *negated,
            Self::Follow { negated, matcher } => matcher.match_at(input, right).is_some() != *negated,
            Self::Match { negated, matcher } => matcher.matches_span(input, left, right) != *negated,
            Self::StartOfLine => input.is_start_of_line(left),
            Self::EndOfLine => input.is_end_of_line(right),
            Self::EndOfFile => input.is_end_of_file(right),
            Self::Predicate(p) => p.holds(env, input),
        }
    }
}

/// Whether every condition in `conditions` holds.
pub(crate) fn all_hold(
    conditions: &[CompiledCondition],
    input: &Input,
    left: usize,
    right: usize,
    env: &Environment,
) -> bool {
    conditions
        .iter()
        .all(|condition| condition.holds(input, left, right, env))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Value;

    #[test]
    fn test_precede_looks_behind_left_extent() {
        let input = Input::new("a.b");
        let cond = Condition::Precede(Pattern::Char('.')).compile();
        assert!(cond.holds(&input, 2, 3, &Environment::new()));
        assert!(!cond.holds(&input, 1, 2, &Environment::new()));
        assert!(!cond.holds(&input, 0, 1, &Environment::new()));

        let negated = Condition::NotPrecede(Pattern::Char('.')).compile();
        assert!(negated.holds(&input, 0, 1, &Environment::new()));
    }

    #[test]
    fn test_follow_looks_after_right_extent() {
        let input = Input::new("ab");
        let cond = Condition::NotFollow(Pattern::Char('b')).compile();
        assert!(!cond.holds(&input, 0, 1, &Environment::new()));
        assert!(cond.holds(&input, 1, 2, &Environment::new()));
    }

    #[test]
    fn test_match_is_exact() {
        let input = Input::new("if x");
        let keyword = Condition::NotMatch(Pattern::literal("if")).compile();
        assert!(!keyword.holds(&input, 0, 2, &Environment::new()));
        assert!(keyword.holds(&input, 0, 1, &Environment::new()));
    }

    #[test]
    fn test_line_conditions() {
        let input = Input::new("a\nb");
        let env = Environment::new();
        assert!(Condition::StartOfLine.compile().holds(&input, 2, 2, &env));
        assert!(!Condition::StartOfLine.compile().holds(&input, 1, 1, &env));
        assert!(Condition::EndOfLine.compile().holds(&input, 0, 1, &env));
        assert!(Condition::EndOfFile.compile().holds(&input, 2, 3, &env));
        assert!(!Condition::EndOfFile.compile().holds(&input, 0, 1, &env));
    }

    #[test]
    fn test_predicate_reads_environment() {
        let input = Input::new("");
        let cond = Condition::predicate("n > 0", |env, _| env.int("n").is_some_and(|n| n > 0)).compile();
        assert!(cond.holds(&input, 0, 0, &Environment::new().bind("n", Value::Int(2))));
        assert!(!cond.holds(&input, 0, 0, &Environment::new().bind("n", Value::Int(0))));
        assert!(!cond.holds(&input, 0, 0, &Environment::new()));
    }
}
