//! # Forest Export
//!
//! Flattens the forest below a root into a list of [`ExportedNode`]s that
//! serializes to JSON (or any other serde format), and rebuilds a forest
//! from such a list against the same grammar. Node `0` is always the root.
//! Nodes refer to their children by id; symbol nodes list their packed
//! nodes, packed nodes list their one or two children.
//!
//! Labels are grammar names: terminal names, nonterminal names and slot
//! labels. Importing resolves them in the grammar, so a forest can only be
//! imported against a grammar with the same labels.

use crate::error::ImportError;
use crate::grammar::{GrammarGraph, TerminalId};
use crate::sppf::{Forest, NodeId, SppfNode};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportedKind {
    #[serde(rename = "TerminalNode")]
    Terminal,
    #[serde(rename = "NonterminalNode")]
    Nonterminal,
    #[serde(rename = "IntermediateNode")]
    Intermediate,
    #[serde(rename = "PackedNode")]
    Packed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedNode {
    pub id: usize,
    pub kind: ExportedKind,
    pub label: String,
    pub left_extent: usize,
    pub right_extent: usize,
    pub children: Vec<usize>,
}

struct Exporter<'f> {
    forest: &'f Forest,
    ids: HashMap<NodeId, usize>,
    nodes: Vec<Option<ExportedNode>>,
    queue: VecDeque<NodeId>,
}

impl Exporter<'_> {
    fn id_of(&mut self, node: NodeId) -> usize {
        if let Some(&id) = self.ids.get(&node) {
            return id;
        }
        let id = self.fresh();
        self.ids.insert(node, id);
        self.queue.push_back(node);
        id
    }

    fn fresh(&mut self) -> usize {
        self.nodes.push(None);
        self.nodes.len() - 1
    }

    fn run(mut self, root: NodeId) -> Vec<ExportedNode> {
        let forest = self.forest;
        self.id_of(root);

        while let Some(node) = self.queue.pop_front() {
            let id = self.ids[&node];
            let left_extent = forest.left_extent(node);
            let right_extent = forest.right_extent(node);
            let (kind, children) = match forest.node(node) {
                SppfNode::Terminal { .. } => (ExportedKind::Terminal, Vec::new()),
                symbol @ (SppfNode::Nonterminal { .. } | SppfNode::Intermediate { .. }) => {
                    let kind = if matches!(symbol, SppfNode::Nonterminal { .. }) {
                        ExportedKind::Nonterminal
                    } else {
                        ExportedKind::Intermediate
                    };
                    let mut children = Vec::new();
                    for packed in forest.packed_children(node) {
                        let packed_id = self.fresh();
                        let grandchildren = packed
                            .children()
                            .into_iter()
                            .map(|child| self.id_of(child))
                            .collect();
                        self.nodes[packed_id] = Some(ExportedNode {
                            id: packed_id,
                            kind: ExportedKind::Packed,
                            label: forest.grammar().slot(packed.slot).label.to_string(),
                            left_extent,
                            right_extent,
                            children: grandchildren,
                        });
                        children.push(packed_id);
                    }
                    (kind, children)
                }
                SppfNode::Packed(_) => continue,
            };
            self.nodes[id] = Some(ExportedNode {
                id,
                kind,
                label: forest.label(node).to_string(),
                left_extent,
                right_extent,
                children,
            });
        }

        self.nodes.into_iter().flatten().collect()
    }
}

/// Flatten the forest below `root`, breadth first.
#[must_use]
pub fn export(forest: &Forest, root: NodeId) -> Vec<ExportedNode> {
    Exporter {
        forest,
        ids: HashMap::new(),
        nodes: Vec::new(),
        queue: VecDeque::new(),
    }
    .run(root)
}

fn terminal_by_name(grammar: &GrammarGraph, name: &str) -> Result<TerminalId, ImportError> {
    if name == grammar.terminal_name(TerminalId::EPSILON) {
        return Ok(TerminalId::EPSILON);
    }
    grammar
        .terminals()
        .iter()
        .position(|terminal| terminal.name == name)
        .map(TerminalId::from_index)
        .ok_or_else(|| ImportError::UnknownTerminal(name.into()))
}

/// Rebuild a forest from exported nodes; returns the root and the forest.
///
/// # Errors
///
/// Returns an [`ImportError`] if a label is unknown to `grammar`, a child id
/// is missing, a node has the wrong number or kind of children, or node `0`
/// is not a nonterminal node.
pub fn import(
    grammar: Arc<GrammarGraph>,
    nodes: &[ExportedNode],
) -> Result<(NodeId, Forest), ImportError> {
    let mut forest = Forest::new(Arc::clone(&grammar));
    let by_id: HashMap<usize, &ExportedNode> = nodes.iter().map(|node| (node.id, node)).collect();
    let mut created: HashMap<usize, NodeId> = HashMap::new();

    for node in nodes {
        let (left, right) = (node.left_extent, node.right_extent);
        let id = match node.kind {
            ExportedKind::Terminal => {
                forest.terminal_node(terminal_by_name(&grammar, &node.label)?, left, right)
            }
            ExportedKind::Nonterminal => {
                forest.nonterminal_node(grammar.head_by_name(&node.label)?, left, right)
            }
            ExportedKind::Intermediate => {
                forest.intermediate_node(grammar.slot_by_label(&node.label)?, left, right)
            }
            ExportedKind::Packed => continue,
        };
        created.insert(node.id, id);
    }

    for node in nodes {
        if !matches!(node.kind, ExportedKind::Nonterminal | ExportedKind::Intermediate) {
            continue;
        }
        let parent = created[&node.id];
        for &packed_id in &node.children {
            let packed = by_id
                .get(&packed_id)
                .ok_or(ImportError::MissingNode(packed_id))?;
            if packed.kind != ExportedKind::Packed {
                return Err(ImportError::InvalidChildren(node.id));
            }
            let slot = grammar.slot_by_label(&packed.label)?;
            let children = packed
                .children
                .iter()
                .map(|child| created.get(child).copied().ok_or(ImportError::MissingNode(*child)))
                .collect::<Result<Vec<_>, _>>()?;
            match children[..] {
                [left] => {
                    let pivot = forest.right_extent(left);
                    forest.add_packed(parent, slot, pivot, left, None);
                }
                [left, right] => {
                    let pivot = forest.left_extent(right);
                    forest.add_packed(parent, slot, pivot, left, Some(right));
                }
                _ => return Err(ImportError::InvalidChildren(packed.id)),
            }
        }
    }

    match by_id.get(&0) {
        Some(root) if root.kind == ExportedKind::Nonterminal => Ok((created[&0], forest)),
        Some(_) => Err(ImportError::RootNotNonterminal),
        None => Err(ImportError::MissingNode(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarBuilder, Symbol};
    use crate::input::Input;
    use crate::parser::GllParser;
    use crate::visit::count_trees;

    fn grammar() -> Arc<GrammarGraph> {
        Arc::new(
            GrammarBuilder::new()
                .rule("S", [Symbol::nt("S"), Symbol::nt("S")])
                .rule("S", [Symbol::char('a')])
                .build()
                .unwrap(),
        )
    }

    fn parse(text: &str) -> (NodeId, Forest) {
        let success = GllParser::new(grammar())
            .parse(&Input::new(text), "S")
            .unwrap()
            .into_success()
            .unwrap();
        (success.root, success.forest)
    }

    #[test]
    fn test_export_shape() {
        let (root, forest) = parse("a");
        let nodes = export(&forest, root);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].kind, ExportedKind::Nonterminal);
        assert_eq!(nodes[0].label, "S");
        assert_eq!(nodes[0].children, vec![1]);
        assert_eq!(nodes[1].kind, ExportedKind::Packed);
        assert_eq!(nodes[1].label, "S ::= 'a' .");
        assert_eq!(nodes[1].children, vec![2]);
        assert_eq!(nodes[2].kind, ExportedKind::Terminal);
        assert_eq!((nodes[2].left_extent, nodes[2].right_extent), (0, 1));
    }

    #[test]
    fn test_json_field_names() {
        let (root, forest) = parse("a");
        let json = serde_json::to_value(export(&forest, root)).unwrap();
        assert_eq!(json[0]["kind"], "NonterminalNode");
        assert_eq!(json[0]["rightExtent"], 1);
        assert_eq!(json[2]["kind"], "TerminalNode");
    }

    #[test]
    fn test_import_rebuilds_an_equal_forest() {
        let (root, forest) = parse("aaaa");
        let exported = export(&forest, root);
        let json = serde_json::to_string(&exported).unwrap();
        let decoded: Vec<ExportedNode> = serde_json::from_str(&json).unwrap();

        let (imported_root, imported) = import(grammar(), &decoded).unwrap();
        assert_eq!(export(&imported, imported_root), exported);
        assert_eq!(count_trees(&imported, imported_root), Some(5));
    }

    #[test]
    fn test_import_rejects_unknown_labels() {
        let (root, forest) = parse("a");
        let mut nodes = export(&forest, root);
        nodes[1].label = "S ::= 'b' .".into();
        assert!(matches!(
            import(grammar(), &nodes),
            Err(ImportError::Grammar(_))
        ));

        let mut nodes = export(&forest, root);
        nodes[0].children = vec![7];
        assert_eq!(import(grammar(), &nodes).unwrap_err(), ImportError::MissingNode(7));
    }
}
