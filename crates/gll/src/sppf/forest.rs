use super::node::{Alternatives, NodeId, PackedNode, SppfNode};
use crate::grammar::{GrammarGraph, HeadId, SlotId, TerminalId};
use hashbrown::{HashMap, HashSet};
use std::ops::Index;
use std::sync::Arc;

/// Node counts by kind. Packed counts every derivation, inline or allocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCounts {
    pub terminal: usize,
    pub nonterminal: usize,
    pub intermediate: usize,
    pub packed: usize,
    pub ambiguous: usize,
}

/// Arena of SPPF nodes with hash-consing of symbol and terminal nodes.
///
/// At most one terminal node exists per `(terminal, left, right)`, one
/// nonterminal node per `(head, left, right)` and one intermediate node per
/// `(slot, left, right)`. Each symbol node has at most one derivation per
/// `(slot, pivot)`.
#[derive(Debug)]
pub struct Forest {
    grammar: Arc<GrammarGraph>,
    nodes: Vec<SppfNode>,
    terminals: HashMap<(TerminalId, usize, usize), NodeId>,
    nonterminals: HashMap<(HeadId, usize, usize), NodeId>,
    intermediates: HashMap<(SlotId, usize, usize), NodeId>,
    packed_keys: HashSet<(NodeId, SlotId, usize)>,
    counts: NodeCounts,
}

impl Forest {
    pub(crate) fn new(grammar: Arc<GrammarGraph>) -> Self {
        Self {
            grammar,
            nodes: Vec::new(),
            terminals: HashMap::new(),
            nonterminals: HashMap::new(),
            intermediates: HashMap::new(),
            packed_keys: HashSet::new(),
            counts: NodeCounts::default(),
        }
    }

    fn push(&mut self, node: SppfNode) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    pub(crate) fn terminal_node(&mut self, terminal: TerminalId, left: usize, right: usize) -> NodeId {
        if let Some(&id) = self.terminals.get(&(terminal, left, right)) {
            return id;
        }
        let id = self.push(SppfNode::Terminal {
            terminal,
            left,
            right,
        });
        self.terminals.insert((terminal, left, right), id);
        self.counts.terminal += 1;
        tracing::trace!(terminal = self.grammar.terminal_name(terminal), left, right, "terminal node");
        id
    }

    pub(crate) fn epsilon_node(&mut self, position: usize) -> NodeId {
        self.terminal_node(TerminalId::EPSILON, position, position)
    }

    pub(crate) fn nonterminal_node(&mut self, head: HeadId, left: usize, right: usize) -> NodeId {
        if let Some(&id) = self.nonterminals.get(&(head, left, right)) {
            return id;
        }
        let id = self.push(SppfNode::Nonterminal {
            head,
            left,
            right,
            alternatives: Alternatives::None,
        });
        self.nonterminals.insert((head, left, right), id);
        self.counts.nonterminal += 1;
        tracing::trace!(head = %self.grammar.head(head).name, left, right, "nonterminal node");
        id
    }

    pub(crate) fn intermediate_node(&mut self, slot: SlotId, left: usize, right: usize) -> NodeId {
        if let Some(&id) = self.intermediates.get(&(slot, left, right)) {
            return id;
        }
        let id = self.push(SppfNode::Intermediate {
            slot,
            left,
            right,
            alternatives: Alternatives::None,
        });
        self.intermediates.insert((slot, left, right), id);
        self.counts.intermediate += 1;
        tracing::trace!(slot = %self.grammar.slot(slot).label, left, right, "intermediate node");
        id
    }

    /// Record the derivation `(slot, pivot, left, right)` under `parent`.
    ///
    /// Returns whether a new derivation was added. The first derivation is
    /// stored inline; the second distinct one allocates packed nodes for
    /// both; later ones are deduplicated through a set keyed by
    /// `(parent, slot, pivot)`.
    pub(crate) fn add_packed(
        &mut self,
        parent: NodeId,
        slot: SlotId,
        pivot: usize,
        left: NodeId,
        right: Option<NodeId>,
    ) -> bool {
        let packed = PackedNode {
            slot,
            pivot,
            parent,
            left,
            right,
        };
        let Some(alternatives) = self.nodes[parent.index()].alternatives_mut() else {
            debug_assert!(false, "packed node under a non-symbol node");
            return false;
        };

        match std::mem::take(alternatives) {
            Alternatives::None => {
                *alternatives = Alternatives::Inline(packed);
                self.counts.packed += 1;
                true
            }
            Alternatives::Inline(first) if first.slot == slot && first.pivot == pivot => {
                *alternatives = Alternatives::Inline(first);
                false
            }
            Alternatives::Inline(first) => {
                let first_id = self.push(SppfNode::Packed(first));
                let second_id = self.push(SppfNode::Packed(packed));
                self.packed_keys.insert((parent, first.slot, first.pivot));
                self.packed_keys.insert((parent, slot, pivot));
                if let Some(alternatives) = self.nodes[parent.index()].alternatives_mut() {
                    *alternatives = Alternatives::Packed(vec![first_id, second_id]);
                }
                self.counts.packed += 1;
                self.counts.ambiguous += 1;
                tracing::trace!(parent = parent.0, "node became ambiguous");
                true
            }
            Alternatives::Packed(mut ids) => {
                let added = self.packed_keys.insert((parent, slot, pivot));
                if added {
                    ids.push(self.push(SppfNode::Packed(packed)));
                    self.counts.packed += 1;
                }
                if let Some(alternatives) = self.nodes[parent.index()].alternatives_mut() {
                    *alternatives = Alternatives::Packed(ids);
                }
                added
            }
        }
    }

    /// The grammar whose slots and heads label this forest.
    #[must_use]
    pub fn grammar(&self) -> &GrammarGraph {
        &self.grammar
    }

    /// Number of nodes in the arena. Inline derivations are not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub const fn counts(&self) -> NodeCounts {
        self.counts
    }

    /// The node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this forest.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &SppfNode {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&SppfNode> {
        self.nodes.get(id.index())
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SppfNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(u32::try_from(i).unwrap_or(u32::MAX)), node))
    }

    #[must_use]
    pub fn left_extent(&self, id: NodeId) -> usize {
        match &self.nodes[id.index()] {
            SppfNode::Terminal { left, .. }
            | SppfNode::Nonterminal { left, .. }
            | SppfNode::Intermediate { left, .. } => *left,
            SppfNode::Packed(packed) => self.left_extent(packed.left),
        }
    }

    #[must_use]
    pub fn right_extent(&self, id: NodeId) -> usize {
        match &self.nodes[id.index()] {
            SppfNode::Terminal { right, .. }
            | SppfNode::Nonterminal { right, .. }
            | SppfNode::Intermediate { right, .. } => *right,
            SppfNode::Packed(packed) => self.right_extent(packed.right.unwrap_or(packed.left)),
        }
    }

    /// Derivations of a symbol node; empty for terminal and packed nodes.
    #[must_use]
    pub fn packed_children(&self, id: NodeId) -> PackedChildren<'_> {
        let (inline, ids): (Option<PackedNode>, &[NodeId]) =
            match self.nodes[id.index()].alternatives() {
                Some(Alternatives::Inline(packed)) => (Some(*packed), &[][..]),
                Some(Alternatives::Packed(ids)) => (None, ids),
                Some(Alternatives::None) | None => (None, &[][..]),
            };
        PackedChildren {
            forest: self,
            inline,
            ids: ids.iter(),
        }
    }

    /// Whether a symbol node has two or more derivations.
    #[must_use]
    pub fn is_ambiguous(&self, id: NodeId) -> bool {
        self.nodes[id.index()]
            .alternatives()
            .is_some_and(|alternatives| alternatives.len() > 1)
    }

    /// Human-readable label: terminal name, nonterminal name, or slot label.
    #[must_use]
    pub fn label(&self, id: NodeId) -> &str {
        match &self.nodes[id.index()] {
            SppfNode::Terminal { terminal, .. } => self.grammar.terminal_name(*terminal),
            SppfNode::Nonterminal { head, .. } => &self.grammar.head(*head).name,
            SppfNode::Intermediate { slot, .. } => &self.grammar.slot(*slot).label,
            SppfNode::Packed(packed) => &self.grammar.slot(packed.slot).label,
        }
    }

    #[must_use]
    pub fn find_terminal(&self, terminal: TerminalId, left: usize, right: usize) -> Option<NodeId> {
        self.terminals.get(&(terminal, left, right)).copied()
    }

    #[must_use]
    pub fn find_nonterminal(&self, head: HeadId, left: usize, right: usize) -> Option<NodeId> {
        self.nonterminals.get(&(head, left, right)).copied()
    }

    #[must_use]
    pub fn find_intermediate(&self, slot: SlotId, left: usize, right: usize) -> Option<NodeId> {
        self.intermediates.get(&(slot, left, right)).copied()
    }
}

impl Index<NodeId> for Forest {
    type Output = SppfNode;

    fn index(&self, id: NodeId) -> &SppfNode {
        self.node(id)
    }
}

/// Iterator over the derivations of a symbol node.
#[derive(Debug, Clone)]
pub struct PackedChildren<'a> {
    forest: &'a Forest,
    inline: Option<PackedNode>,
    ids: std::slice::Iter<'a, NodeId>,
}

impl Iterator for PackedChildren<'_> {
    type Item = PackedNode;

    fn next(&mut self) -> Option<PackedNode> {
        if let Some(packed) = self.inline.take() {
            return Some(packed);
        }
        self.ids.find_map(|&id| match self.forest.nodes[id.index()] {
            SppfNode::Packed(packed) => Some(packed),
            _ => None,
        })
    }
}
