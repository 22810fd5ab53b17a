//! The grammar slot graph executed by the parser.
//!
//! Every nonterminal has a [`HeadSlot`]. Every position in every alternative
//! has a [`BodySlot`], labeled `X ::= a . b`. Slots of one alternative are
//! stored contiguously, so the slot after `s` is `s + 1` unless `s` is last.

use super::condition::CompiledCondition;
use super::test::{FollowTest, PredictionTest};
use crate::env::Expr;
use crate::error::GrammarError;
use crate::regex::{Matcher, Pattern};
use compact_str::CompactString;
use hashbrown::HashMap;
use std::ops::Index;
use std::sync::Arc;

/// Handle of a nonterminal in a [`GrammarGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct HeadId(pub u32);

/// Handle of a body slot in a [`GrammarGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotId(pub u32);

/// Handle of a terminal in a [`GrammarGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TerminalId(pub u32);

impl TerminalId {
    /// The empty string, matched by empty alternatives.
    pub const EPSILON: Self = Self(u32::MAX);

    #[must_use]
    pub const fn is_epsilon(self) -> bool {
        self.0 == u32::MAX
    }
}

macro_rules! index_conversions {
    ($($id:ident),*) => {$(
        impl $id {
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }
        }
    )*};
}

index_conversions!(HeadId, SlotId, TerminalId);

/// Per-nonterminal entry point.
#[derive(Debug)]
pub struct HeadSlot {
    pub name: CompactString,
    pub params: Vec<CompactString>,
    /// First slot of each alternative, in declaration order.
    pub first_slots: Vec<SlotId>,
    pub nullable: bool,
    pub prediction: PredictionTest,
    pub follow: FollowTest,
}

/// What happens when a body slot executes.
#[derive(Debug, Clone)]
pub enum SlotKind {
    /// Match a terminal and continue with the next slot.
    Terminal(TerminalId),
    /// Call a nonterminal, passing evaluated arguments.
    Call { head: HeadId, args: Vec<Expr> },
    /// End of the alternative: pop.
    Last,
}

/// How a slot's SPPF node is obtained after the preceding symbol is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Position 0: nothing recognized yet.
    Dummy,
    /// Position 1: the node of the single symbol recognized so far.
    PassThrough,
    /// Position 2 or more: an intermediate node over the prefix.
    Intermediate,
}

impl NodeKind {
    #[must_use]
    pub const fn for_position(position: usize) -> Self {
        match position {
            0 => Self::Dummy,
            1 => Self::PassThrough,
            _ => Self::Intermediate,
        }
    }
}

/// A position inside an alternative.
#[derive(Debug)]
pub struct BodySlot {
    pub label: CompactString,
    pub head: HeadId,
    pub alternative: usize,
    pub position: usize,
    pub previous: Option<SlotId>,
    pub kind: SlotKind,
    /// Pre-conditions of the symbol after the dot (plus alternative guards at position 0).
    pub pre: Vec<CompiledCondition>,
    /// Post-conditions of the symbol before the dot.
    pub post: Vec<CompiledCondition>,
    /// Lookahead admitted after the symbol before the dot.
    pub follow: FollowTest,
    pub node_kind: NodeKind,
    /// Label bound to the extent of the symbol before the dot.
    pub binding: Option<CompactString>,
}

impl BodySlot {
    #[must_use]
    pub const fn is_last(&self) -> bool {
        matches!(self.kind, SlotKind::Last)
    }
}

/// A terminal symbol and its compiled matcher.
#[derive(Debug)]
pub struct Terminal {
    pub name: CompactString,
    pub pattern: Pattern,
    pub matcher: Arc<dyn Matcher>,
}

/// An immutable, compiled grammar. Shared across parses behind an `Arc`.
#[derive(Debug)]
pub struct GrammarGraph {
    pub(crate) heads: Vec<HeadSlot>,
    pub(crate) slots: Vec<BodySlot>,
    pub(crate) terminals: Vec<Terminal>,
    pub(crate) head_names: HashMap<CompactString, HeadId>,
    pub(crate) slot_labels: HashMap<CompactString, SlotId>,
}

impl GrammarGraph {
    #[must_use]
    pub fn heads(&self) -> &[HeadSlot] {
        &self.heads
    }

    #[must_use]
    pub fn slots(&self) -> &[BodySlot] {
        &self.slots
    }

    #[must_use]
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    #[must_use]
    pub fn head(&self, id: HeadId) -> &HeadSlot {
        &self.heads[id.index()]
    }

    #[must_use]
    pub fn slot(&self, id: SlotId) -> &BodySlot {
        &self.slots[id.index()]
    }

    #[must_use]
    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.index()]
    }

    /// First slot of every alternative of `head`.
    #[must_use]
    pub fn first_slots(&self, head: HeadId) -> &[SlotId] {
        &self.heads[head.index()].first_slots
    }

    /// The slot after `slot` in its alternative; `None` for last slots.
    #[must_use]
    pub fn next(&self, slot: SlotId) -> Option<SlotId> {
        if self.slot(slot).is_last() {
            None
        } else {
            Some(SlotId(slot.0 + 1))
        }
    }

    /// Look up a nonterminal by name.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UnknownNonterminal`] if no rule defines `name`.
    pub fn head_by_name(&self, name: &str) -> Result<HeadId, GrammarError> {
        self.head_names
            .get(name)
            .copied()
            .ok_or_else(|| GrammarError::UnknownNonterminal(name.into()))
    }

    /// Look up a body slot by its label, e.g. `"A ::= B . 'a'"`.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UnknownSlotLabel`] if no slot carries `label`.
    pub fn slot_by_label(&self, label: &str) -> Result<SlotId, GrammarError> {
        self.slot_labels
            .get(label)
            .copied()
            .ok_or_else(|| GrammarError::UnknownSlotLabel(label.into()))
    }

    /// Display name of a terminal, `ε` for the empty string.
    #[must_use]
    pub fn terminal_name(&self, id: TerminalId) -> &str {
        if id.is_epsilon() {
            "ε"
        } else {
            &self.terminals[id.index()].name
        }
    }
}

impl Index<SlotId> for GrammarGraph {
    type Output = BodySlot;

    fn index(&self, id: SlotId) -> &BodySlot {
        self.slot(id)
    }
}

impl Index<HeadId> for GrammarGraph {
    type Output = HeadSlot;

    fn index(&self, id: HeadId) -> &HeadSlot {
        self.head(id)
    }
}
