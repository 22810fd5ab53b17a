//! # gll
//!
//! Generalized LL parsing for arbitrary context-free grammars, including
//! ambiguous, left-recursive and cyclic ones.
//!
//! ## Overview
//!
//! A grammar is written as BNF rules with [`GrammarBuilder`] and compiled to
//! a slot graph. [`GllParser`] executes that graph over an [`Input`] and
//! produces a shared packed parse forest ([`Forest`]) holding every
//! derivation of the input in worst-case cubic space.
//!
//! - **Graph-structured stack**: one stack node per nonterminal call, shared
//!   by all parses that make the same call ([`gss`])
//! - **Descriptors**: units of pending work, each processed once
//!   ([`descriptor`])
//! - **SPPF**: hash-consed symbol nodes with packed derivations ([`sppf`])
//! - **Lookahead**: prediction and follow tests pre-built from FIRST and
//!   FOLLOW sets, plus context conditions such as "not followed by"
//!   ([`grammar`])
//! - **Data-dependent grammars**: nonterminals with parameters, labeled
//!   symbols and predicates over an [`Environment`] ([`env`])
//!
//! ## Quick Start
//!
//! ```rust
//! use gll::grammar::{GrammarBuilder, Symbol};
//! use gll::{GllParser, Input, count_trees};
//!
//! // E ::= E '+' E | '1'
//! let grammar = GrammarBuilder::new()
//!     .rule("E", [Symbol::nt("E"), Symbol::char('+'), Symbol::nt("E")])
//!     .rule("E", [Symbol::char('1')])
//!     .build()?;
//!
//! let parser = GllParser::new(grammar);
//! let result = parser.parse(&Input::new("1+1+1"), "E")?;
//! let success = result.success().expect("input is in the language");
//! assert!(success.is_ambiguous());
//! assert_eq!(count_trees(&success.forest, success.root), Some(2));
//! # Ok::<(), gll::GllError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel`: parse batches of inputs concurrently with rayon
//! - `serialize`: serde support for configuration, statistics and forest
//!   export

pub mod descriptor;
pub mod env;
pub mod error;
#[cfg(feature = "serialize")]
pub mod export;
pub mod grammar;
pub mod gss;
pub mod input;
pub mod parallel;
pub mod parser;
pub mod regex;
pub mod result;
pub mod sppf;
pub mod visit;

pub use env::{Environment, Expr, Predicate, Value};
#[cfg(feature = "serialize")]
pub use error::ImportError;
pub use error::{GllError, GrammarError, Resource};
pub use grammar::{Alternative, Condition, GrammarBuilder, GrammarGraph, Symbol};
pub use input::{EOF, Input};
pub use parallel::{BatchItem, BatchResult, ParseBatch};
pub use parser::{GllParser, Limits, ParserConfig, Scheduling};
pub use result::{ParseFailure, ParseResult, ParseStatistics, ParseSuccess};
pub use sppf::{Forest, NodeId, SppfNode};
pub use visit::{ForestVisitor, ForestWalker, count_trees, leaves, yield_of};
