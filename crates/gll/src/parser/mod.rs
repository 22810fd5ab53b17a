//! # GLL Parser
//!
//! [`GllParser`] executes a compiled [`GrammarGraph`] against an [`Input`].
//! Every call to [`GllParser::parse`] creates a fresh graph-structured stack,
//! forest and descriptor set; nothing is shared between parses except the
//! grammar itself.
//!
//! ## Usage
//!
//! ```rust
//! use gll::grammar::{GrammarBuilder, Symbol};
//! use gll::{GllParser, Input};
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("A", [Symbol::nt("B"), Symbol::char('a')])
//!     .rule("B", [Symbol::char('b')])
//!     .build()?;
//! let parser = GllParser::new(grammar);
//! let result = parser.parse(&Input::new("ba"), "A")?;
//! assert!(result.is_success());
//! assert_eq!(result.statistics().descriptors, 3);
//! # Ok::<(), gll::GllError>(())
//! ```

mod runtime;

use crate::descriptor::{QueueScheduler, StackScheduler};
use crate::env::Value;
use crate::error::{GllError, GrammarError};
use crate::grammar::GrammarGraph;
use crate::input::Input;
use crate::result::ParseResult;
use runtime::Runtime;
use std::sync::Arc;

/// Order in which pending descriptors are processed.
///
/// Both orders reach the same fixpoint; they differ only in exploration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Scheduling {
    /// Last in, first out
    #[default]
    Stack,
    /// First in, first out
    Queue,
}

/// Upper bounds on per-parse tables. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Limits {
    pub max_descriptors: Option<usize>,
    pub max_gss_nodes: Option<usize>,
    pub max_sppf_nodes: Option<usize>,
}

/// Configuration options for the GLL parser
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserConfig {
    /// Descriptor processing order
    pub scheduling: Scheduling,

    /// Use prediction and follow tests to prune alternatives and returns
    pub lookahead: bool,

    /// Resource limits; exceeding one aborts the parse
    pub limits: Limits,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            scheduling: Scheduling::Stack,
            lookahead: true,
            limits: Limits::default(),
        }
    }
}

impl ParserConfig {
    /// Create a new configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the descriptor processing order
    #[must_use]
    pub fn with_scheduling(mut self, scheduling: Scheduling) -> Self {
        self.scheduling = scheduling;
        self
    }

    /// Enable or disable lookahead tests
    #[must_use]
    pub fn with_lookahead(mut self, enabled: bool) -> Self {
        self.lookahead = enabled;
        self
    }

    /// Set all resource limits at once
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the maximum number of distinct descriptors
    #[must_use]
    pub fn with_max_descriptors(mut self, max: Option<usize>) -> Self {
        self.limits.max_descriptors = max;
        self
    }

    /// Set the maximum number of GSS nodes
    #[must_use]
    pub fn with_max_gss_nodes(mut self, max: Option<usize>) -> Self {
        self.limits.max_gss_nodes = max;
        self
    }

    /// Set the maximum number of nodes in the forest arena
    #[must_use]
    pub fn with_max_sppf_nodes(mut self, max: Option<usize>) -> Self {
        self.limits.max_sppf_nodes = max;
        self
    }
}

/// A GLL parser over a compiled grammar.
///
/// Cheap to clone; clones share the grammar.
#[derive(Debug, Clone)]
pub struct GllParser {
    grammar: Arc<GrammarGraph>,
    config: ParserConfig,
}

impl GllParser {
    /// Create a parser with the default configuration
    #[must_use]
    pub fn new(grammar: impl Into<Arc<GrammarGraph>>) -> Self {
        Self::with_config(grammar, ParserConfig::default())
    }

    #[must_use]
    pub fn with_config(grammar: impl Into<Arc<GrammarGraph>>, config: ParserConfig) -> Self {
        Self {
            grammar: grammar.into(),
            config,
        }
    }

    #[must_use]
    pub fn grammar(&self) -> &Arc<GrammarGraph> {
        &self.grammar
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse `input` starting from the nonterminal named `start`.
    ///
    /// # Errors
    ///
    /// Returns [`GllError::Grammar`] if `start` is unknown or takes
    /// parameters, and [`GllError::ResourceExhausted`] if a configured
    /// limit is exceeded.
    pub fn parse(&self, input: &Input, start: &str) -> Result<ParseResult, GllError> {
        self.parse_with_args(input, start, &[])
    }

    /// Parse `input` starting from `start` called with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`GllError::Grammar`] if `start` is unknown or `args` does not
    /// match its parameter list, and [`GllError::ResourceExhausted`] if a
    /// configured limit is exceeded.
    pub fn parse_with_args(
        &self,
        input: &Input,
        start: &str,
        args: &[Value],
    ) -> Result<ParseResult, GllError> {
        let head = self.grammar.head_by_name(start)?;
        let expected = self.grammar.head(head).params.len();
        if expected != args.len() {
            return Err(GrammarError::ArityMismatch {
                name: start.into(),
                expected,
                found: args.len(),
            }
            .into());
        }

        tracing::debug!(start, input_len = input.len(), scheduling = ?self.config.scheduling, "parse started");
        let result = match self.config.scheduling {
            Scheduling::Stack => {
                Runtime::new(&self.grammar, &self.config, input, StackScheduler::new())
                    .run(head, args)
            }
            Scheduling::Queue => {
                Runtime::new(&self.grammar, &self.config, input, QueueScheduler::new())
                    .run(head, args)
            }
        }?;
        match &result {
            ParseResult::Success(success) => {
                tracing::debug!(statistics = ?success.statistics, "parse succeeded");
            }
            ParseResult::Failure(failure) => {
                tracing::debug!(position = failure.position, "parse failed");
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarBuilder, Symbol};

    fn parser() -> GllParser {
        let grammar = GrammarBuilder::new()
            .rule("A", [Symbol::nt("B"), Symbol::char('a')])
            .rule("B", [Symbol::char('b')])
            .build()
            .unwrap();
        GllParser::new(grammar)
    }

    #[test]
    fn test_config_builder() {
        let config = ParserConfig::new()
            .with_scheduling(Scheduling::Queue)
            .with_lookahead(false)
            .with_max_descriptors(Some(10));
        assert_eq!(config.scheduling, Scheduling::Queue);
        assert!(!config.lookahead);
        assert_eq!(config.limits.max_descriptors, Some(10));
        assert_eq!(config.limits.max_gss_nodes, None);
        assert_eq!(ParserConfig::default().scheduling, Scheduling::Stack);
    }

    #[test]
    fn test_unknown_start_symbol() {
        let err = parser().parse(&Input::new("ba"), "C").unwrap_err();
        assert_eq!(
            err,
            GllError::Grammar(GrammarError::UnknownNonterminal("C".into()))
        );
    }

    #[test]
    fn test_start_arity_is_checked() {
        let err = parser()
            .parse_with_args(&Input::new("ba"), "A", &[Value::Int(1)])
            .unwrap_err();
        assert!(matches!(
            err,
            GllError::Grammar(GrammarError::ArityMismatch {
                expected: 0,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_parses_are_independent() {
        let parser = parser();
        let first = parser.parse(&Input::new("ba"), "A").unwrap();
        let second = parser.parse(&Input::new("ba"), "A").unwrap();
        assert_eq!(first.statistics(), second.statistics());
        assert!(!parser.parse(&Input::new("bb"), "A").unwrap().is_success());
    }
}
