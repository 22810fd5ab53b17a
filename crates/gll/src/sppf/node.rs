use crate::grammar::{HeadId, SlotId, TerminalId};
use smallvec::SmallVec;

/// Handle of a node in a [`super::Forest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One derivation of a nonterminal or intermediate node.
///
/// `left` covers `[parent.left, pivot)` and `right` covers
/// `[pivot, parent.right)`. A packed node with a single child has no `right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct PackedNode {
    pub slot: SlotId,
    pub pivot: usize,
    pub parent: NodeId,
    pub left: NodeId,
    pub right: Option<NodeId>,
}

impl PackedNode {
    /// The one or two children of this derivation, left to right.
    #[must_use]
    pub fn children(&self) -> SmallVec<[NodeId; 2]> {
        let mut children = SmallVec::new();
        children.push(self.left);
        if let Some(right) = self.right {
            children.push(right);
        }
        children
    }
}

/// Packed children of a symbol node.
///
/// The first derivation is kept inline. Only when a second, distinct one
/// arrives are packed nodes allocated in the arena for both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Alternatives {
    #[default]
    None,
    Inline(PackedNode),
    Packed(Vec<NodeId>),
}

impl Alternatives {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Inline(_) => 1,
            Self::Packed(ids) => ids.len(),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A node of the shared packed parse forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SppfNode {
    /// A matched terminal; `TerminalId::EPSILON` with `left == right` for ε.
    Terminal {
        terminal: TerminalId,
        left: usize,
        right: usize,
    },
    Nonterminal {
        head: HeadId,
        left: usize,
        right: usize,
        alternatives: Alternatives,
    },
    /// A recognized prefix `X ::= a b . c` of an alternative.
    Intermediate {
        slot: SlotId,
        left: usize,
        right: usize,
        alternatives: Alternatives,
    },
    Packed(PackedNode),
}

impl SppfNode {
    #[must_use]
    pub const fn alternatives(&self) -> Option<&Alternatives> {
        match self {
            Self::Nonterminal { alternatives, .. } | Self::Intermediate { alternatives, .. } => {
                Some(alternatives)
            }
            Self::Terminal { .. } | Self::Packed(_) => None,
        }
    }

    pub(crate) fn alternatives_mut(&mut self) -> Option<&mut Alternatives> {
        match self {
            Self::Nonterminal { alternatives, .. } | Self::Intermediate { alternatives, .. } => {
                Some(alternatives)
            }
            Self::Terminal { .. } | Self::Packed(_) => None,
        }
    }

    #[must_use]
    pub const fn is_symbol(&self) -> bool {
        matches!(self, Self::Nonterminal { .. } | Self::Intermediate { .. })
    }
}
