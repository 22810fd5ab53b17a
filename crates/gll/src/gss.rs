//! Graph-structured stack
//!
//! A GSS node stands for "nonterminal `head` called at `position` with
//! arguments `data`". Its edges point back to callers and carry everything
//! needed to resume them: the return slot, the caller's GSS node, the SPPF
//! node built so far in the caller's alternative, and the caller's
//! environment. The popped-elements memo records each right extent at which
//! the node has already returned, so that edges added later can be
//! reconciled with results that arrived first.

use crate::env::{Environment, Value};
use crate::grammar::{HeadId, SlotId};
use crate::sppf::NodeId;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

/// Handle of a GSS node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GssId(pub u32);

impl GssId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Evaluated call arguments; empty for purely syntactic grammars.
pub type GssData = SmallVec<[Value; 2]>;

/// A return path from a callee node to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GssEdge {
    pub return_slot: SlotId,
    pub dest: GssId,
    /// The caller's SPPF node before the call; `None` at position 0.
    pub node: Option<NodeId>,
    pub env: Environment,
}

#[derive(Debug)]
pub struct GssNode {
    pub head: HeadId,
    pub position: usize,
    pub data: GssData,
    edges: SmallVec<[GssEdge; 1]>,
    popped: HashMap<usize, NodeId>,
}

impl GssNode {
    #[must_use]
    pub fn edges(&self) -> &[GssEdge] {
        &self.edges
    }

    /// Right extents this node has returned at, with the nonterminal node built for each.
    pub fn popped(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.popped.iter().map(|(&right, &node)| (right, node))
    }
}

/// The stack graph of one parse.
#[derive(Debug, Default)]
pub struct Gss {
    nodes: Vec<GssNode>,
    lookup: HashMap<(HeadId, usize, GssData), GssId>,
    edge_keys: HashSet<(GssId, GssEdge)>,
    edge_count: usize,
}

impl Gss {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The node for `(head, position, data)`, and whether it was just created.
    pub fn get_or_create(&mut self, head: HeadId, position: usize, data: GssData) -> (GssId, bool) {
        if let Some(&id) = self.lookup.get(&(head, position, data.clone())) {
            return (id, false);
        }
        let id = GssId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(GssNode {
            head,
            position,
            data: data.clone(),
            edges: SmallVec::new(),
            popped: HashMap::new(),
        });
        self.lookup.insert((head, position, data), id);
        tracing::trace!(gss = id.0, head = head.0, position, "gss node");
        (id, true)
    }

    /// Add `edge` from `source`; returns false if an equal edge exists.
    pub fn add_edge(&mut self, source: GssId, edge: GssEdge) -> bool {
        if !self.edge_keys.insert((source, edge.clone())) {
            return false;
        }
        self.nodes[source.index()].edges.push(edge);
        self.edge_count += 1;
        true
    }

    /// Record that `id` returned at `right` with `node`; false if already recorded.
    pub fn insert_popped(&mut self, id: GssId, right: usize, node: NodeId) -> bool {
        let popped = &mut self.nodes[id.index()].popped;
        if popped.contains_key(&right) {
            return false;
        }
        popped.insert(right, node);
        true
    }

    #[must_use]
    pub fn node(&self, id: GssId) -> &GssNode {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn find(&self, head: HeadId, position: usize, data: &[Value]) -> Option<GssId> {
        self.lookup
            .get(&(head, position, data.iter().cloned().collect::<GssData>()))
            .copied()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }
}
