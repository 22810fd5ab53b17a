//! Read-only traversal of a parse forest.
//!
//! [`ForestWalker`] visits every node reachable from a root exactly once,
//! following all derivations. Shared sub-forests are not revisited, so a
//! walk is linear in the size of the forest even when the number of trees
//! is exponential. The walk uses an explicit stack.
//!
//! [`count_trees`] and [`leaves`] interpret the forest as a set of trees.

use crate::input::Input;
use crate::sppf::{Forest, NodeId, PackedNode, SppfNode};
use hashbrown::{HashMap, HashSet};
use std::ops::ControlFlow;

/// Trait for visiting a forest
pub trait ForestVisitor {
    /// Called when entering a nonterminal or intermediate node
    fn enter_symbol(&mut self, forest: &Forest, id: NodeId) -> ControlFlow<()> {
        let _ = (forest, id);
        ControlFlow::Continue(())
    }

    /// Called after every derivation below a symbol node has been visited
    fn exit_symbol(&mut self, forest: &Forest, id: NodeId) -> ControlFlow<()> {
        let _ = (forest, id);
        ControlFlow::Continue(())
    }

    /// Called for each derivation of a symbol node, before its children
    fn visit_packed(&mut self, forest: &Forest, packed: &PackedNode) -> ControlFlow<()> {
        let _ = (forest, packed);
        ControlFlow::Continue(())
    }

    /// Called when visiting a terminal or ε node
    fn visit_terminal(&mut self, forest: &Forest, id: NodeId) -> ControlFlow<()> {
        let _ = (forest, id);
        ControlFlow::Continue(())
    }
}

enum Frame {
    Enter(NodeId),
    Packed(PackedNode),
    Exit(NodeId),
}

/// Walker that drives forest traversal and calls visitor methods
pub struct ForestWalker<'v, V> {
    visitor: &'v mut V,
}

impl<'v, V: ForestVisitor> ForestWalker<'v, V> {
    pub const fn new(visitor: &'v mut V) -> Self {
        Self { visitor }
    }

    /// Walk the forest below `root` depth-first, left to right.
    pub fn walk(&mut self, forest: &Forest, root: NodeId) -> ControlFlow<()> {
        let mut visited = HashSet::new();
        let mut stack = vec![Frame::Enter(root)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id) => {
                    if !visited.insert(id) {
                        continue;
                    }
                    match &forest[id] {
                        SppfNode::Terminal { .. } => self.visitor.visit_terminal(forest, id)?,
                        SppfNode::Nonterminal { .. } | SppfNode::Intermediate { .. } => {
                            self.visitor.enter_symbol(forest, id)?;
                            stack.push(Frame::Exit(id));
                            let packed: Vec<PackedNode> = forest.packed_children(id).collect();
                            stack.extend(packed.into_iter().rev().map(Frame::Packed));
                        }
                        SppfNode::Packed(packed) => stack.push(Frame::Packed(*packed)),
                    }
                }
                Frame::Packed(packed) => {
                    self.visitor.visit_packed(forest, &packed)?;
                    stack.extend(packed.children().into_iter().rev().map(Frame::Enter));
                }
                Frame::Exit(id) => self.visitor.exit_symbol(forest, id)?,
            }
        }
        ControlFlow::Continue(())
    }
}

impl Forest {
    /// Walk the forest below `root` with a visitor
    pub fn walk_with<V: ForestVisitor>(&self, root: NodeId, visitor: &mut V) -> ControlFlow<()> {
        ForestWalker::new(visitor).walk(self, root)
    }
}

enum Count {
    InProgress,
    Done(u128),
}

/// Number of distinct derivation trees below `root`.
///
/// Returns `None` if a cycle is reachable from `root` (infinitely many
/// trees) or the count does not fit in a `u128`.
#[must_use]
pub fn count_trees(forest: &Forest, root: NodeId) -> Option<u128> {
    let mut memo: HashMap<NodeId, Count> = HashMap::new();
    let mut stack = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            let mut total: u128 = 0;
            for packed in forest.packed_children(id) {
                let mut product: u128 = 1;
                for child in packed.children() {
                    let Some(Count::Done(n)) = memo.get(&child) else {
                        return None;
                    };
                    product = product.checked_mul(*n)?;
                }
                total = total.checked_add(product)?;
            }
            memo.insert(id, Count::Done(total));
            continue;
        }

        match memo.get(&id) {
            Some(Count::Done(_)) => continue,
            Some(Count::InProgress) => return None,
            None => {}
        }
        if let SppfNode::Terminal { .. } = forest[id] {
            memo.insert(id, Count::Done(1));
            continue;
        }
        memo.insert(id, Count::InProgress);
        stack.push((id, true));
        for packed in forest.packed_children(id) {
            for child in packed.children() {
                match memo.get(&child) {
                    Some(Count::InProgress) => return None,
                    Some(Count::Done(_)) => {}
                    None => stack.push((child, false)),
                }
            }
        }
    }

    match memo.get(&root) {
        Some(Count::Done(n)) => Some(*n),
        _ => None,
    }
}

/// A symbol node whose derivations are being tried, in order.
struct LeafFrame {
    id: NodeId,
    alternatives: Vec<PackedNode>,
    alternative: usize,
    child: usize,
    mark: usize,
}

/// Terminal leaves of one derivation tree below `root`, left to right.
///
/// At each symbol node the first derivation that does not lead back into
/// the current path is taken. ε leaves are omitted.
#[must_use]
pub fn leaves(forest: &Forest, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut path = HashSet::new();
    let mut stack: Vec<LeafFrame> = Vec::new();
    // outcome of the node entered last; `None` while its frame is open
    let mut outcome = enter_leaf(forest, root, &mut path, &mut out, &mut stack);

    while let Some(frame) = stack.last_mut() {
        match outcome.take() {
            Some(true) => frame.child += 1,
            Some(false) => {
                out.truncate(frame.mark);
                frame.alternative += 1;
                frame.child = 0;
            }
            None => {}
        }

        let next = match frame.alternatives.get(frame.alternative) {
            Some(packed) => packed.children().get(frame.child).copied().ok_or(true),
            None => Err(false),
        };
        match next {
            Ok(child) => outcome = enter_leaf(forest, child, &mut path, &mut out, &mut stack),
            Err(found) => {
                if let Some(done) = stack.pop() {
                    path.remove(&done.id);
                }
                outcome = Some(found);
            }
        }
    }
    out
}

/// Enter `id`. Terminals and nodes already on the path resolve at once;
/// symbol nodes open a frame and resolve later.
fn enter_leaf(
    forest: &Forest,
    id: NodeId,
    path: &mut HashSet<NodeId>,
    out: &mut Vec<NodeId>,
    stack: &mut Vec<LeafFrame>,
) -> Option<bool> {
    if let SppfNode::Terminal { terminal, .. } = forest[id] {
        if !terminal.is_epsilon() {
            out.push(id);
        }
        return Some(true);
    }
    if !path.insert(id) {
        return Some(false);
    }
    stack.push(LeafFrame {
        id,
        alternatives: forest.packed_children(id).collect(),
        alternative: 0,
        child: 0,
        mark: out.len(),
    });
    None
}

/// The text matched by the leaves of one derivation tree below `root`,
/// with leaves separated by `separator`.
#[must_use]
pub fn yield_of(forest: &Forest, root: NodeId, input: &Input, separator: &str) -> String {
    leaves(forest, root)
        .into_iter()
        .map(|leaf| input.text(forest.left_extent(leaf), forest.right_extent(leaf)))
        .collect::<Vec<_>>()
        .join(separator)
}
