//! Parse outcomes.

use crate::sppf::{Forest, NodeId};
use compact_str::CompactString;

/// Counts gathered over one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseStatistics {
    /// Distinct descriptors scheduled
    pub descriptors: usize,
    pub gss_nodes: usize,
    pub gss_edges: usize,
    pub nonterminal_nodes: usize,
    pub intermediate_nodes: usize,
    pub terminal_nodes: usize,
    /// Derivations recorded, whether stored inline or as arena nodes
    pub packed_nodes: usize,
    /// Symbol nodes with two or more derivations
    pub ambiguous_nodes: usize,
}

/// The start symbol derives the whole input.
#[derive(Debug)]
pub struct ParseSuccess {
    /// The start symbol's node spanning `[0, input.len())`
    pub root: NodeId,
    pub forest: Forest,
    pub statistics: ParseStatistics,
}

impl ParseSuccess {
    /// Whether any node reachable in the forest has more than one derivation.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        self.statistics.ambiguous_nodes > 0
    }
}

/// No derivation of the start symbol covers the whole input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Furthest right extent reached by a terminal match
    pub position: usize,
    /// Labels of the slots and nonterminals executed at `position`
    pub active_slots: Vec<CompactString>,
    pub statistics: ParseStatistics,
}

#[derive(Debug)]
pub enum ParseResult {
    Success(ParseSuccess),
    Failure(ParseFailure),
}

impl ParseResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub const fn success(&self) -> Option<&ParseSuccess> {
        match self {
            Self::Success(success) => Some(success),
            Self::Failure(_) => None,
        }
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&ParseFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    #[must_use]
    pub fn into_success(self) -> Option<ParseSuccess> {
        match self {
            Self::Success(success) => Some(success),
            Self::Failure(_) => None,
        }
    }

    /// The root and forest of a successful parse.
    #[must_use]
    pub fn forest(&self) -> Option<(NodeId, &Forest)> {
        self.success().map(|success| (success.root, &success.forest))
    }

    #[must_use]
    pub const fn statistics(&self) -> ParseStatistics {
        match self {
            Self::Success(success) => success.statistics,
            Self::Failure(failure) => failure.statistics,
        }
    }
}
