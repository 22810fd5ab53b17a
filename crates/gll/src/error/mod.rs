//! # Error Types
//!
//! Two error enums cover everything that can go wrong:
//!
//! - [`GrammarError`]: the grammar handed to the builder, or a name looked up
//!   in a compiled grammar, is not valid.
//! - [`GllError`]: a parse was aborted, either because of a grammar-level
//!   problem discovered when starting the parse or because a configured
//!   resource limit was exceeded.
//!
//! Failing to recognize the input is *not* an error: it is reported as
//! [`crate::ParseResult::Failure`].

use compact_str::CompactString;
use std::fmt;
use thiserror::Error;

/// Errors raised while compiling a grammar or resolving names in one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("grammar has no rules")]
    Empty,

    #[error("nonterminal `{name}` is referenced from `{from}` but has no rules")]
    UndefinedNonterminal {
        name: CompactString,
        from: CompactString,
    },

    #[error("unknown nonterminal `{0}`")]
    UnknownNonterminal(CompactString),

    #[error("unknown grammar slot `{0}`")]
    UnknownSlotLabel(CompactString),

    #[error("`{name}` expects {expected} argument(s), found {found}")]
    ArityMismatch {
        name: CompactString,
        expected: usize,
        found: usize,
    },

    #[error("parameter `{param}` is declared twice on `{name}`")]
    DuplicateParameter {
        name: CompactString,
        param: CompactString,
    },

    #[error("parameters declared for `{0}`, which has no rules")]
    ParamsWithoutRule(CompactString),

    #[error("invalid pattern {pattern} in `{rule}`: a character class is empty")]
    InvalidPattern {
        rule: CompactString,
        pattern: CompactString,
    },
}

/// A per-parse table that can be bounded through [`crate::Limits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Resource {
    Descriptors,
    GssNodes,
    SppfNodes,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Descriptors => "descriptors",
            Self::GssNodes => "GSS nodes",
            Self::SppfNodes => "SPPF nodes",
        })
    }
}

/// Errors that abort a parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GllError {
    #[error("parse aborted: more than {limit} {resource} created")]
    ResourceExhausted { resource: Resource, limit: usize },

    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Errors raised while rebuilding a forest from exported nodes.
#[cfg(feature = "serialize")]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("unknown terminal `{0}`")]
    UnknownTerminal(CompactString),

    #[error("node {0} is referenced but not defined")]
    MissingNode(usize),

    #[error("node {0} has an invalid list of children")]
    InvalidChildren(usize),

    #[error("node 0 is not a nonterminal node")]
    RootNotNonterminal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = GrammarError::UndefinedNonterminal {
            name: "B".into(),
            from: "A".into(),
        };
        assert_eq!(
            err.to_string(),
            "nonterminal `B` is referenced from `A` but has no rules"
        );

        let err = GllError::ResourceExhausted {
            resource: Resource::GssNodes,
            limit: 10,
        };
        assert_eq!(err.to_string(), "parse aborted: more than 10 GSS nodes created");
    }

    #[test]
    fn test_grammar_error_converts() {
        let err: GllError = GrammarError::UnknownNonterminal("S".into()).into();
        assert_eq!(err.to_string(), "unknown nonterminal `S`");
    }
}
