//! Slot execution for a single parse.

use super::ParserConfig;
use crate::descriptor::{Descriptor, Scheduler};
use crate::env::{Environment, Value};
use crate::error::{GllError, Resource};
use crate::grammar::{GrammarGraph, HeadId, NodeKind, SlotId, SlotKind, all_hold};
use crate::gss::{Gss, GssData, GssEdge, GssId};
use crate::input::Input;
use crate::result::{ParseFailure, ParseResult, ParseStatistics, ParseSuccess};
use crate::sppf::{Forest, NodeId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Something executed at the furthest position, reported on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Active {
    Head(HeadId),
    Slot(SlotId),
}

pub(super) struct Runtime<'a, S> {
    grammar: &'a GrammarGraph,
    config: &'a ParserConfig,
    input: &'a Input,
    scheduler: S,
    gss: Gss,
    forest: Forest,
    furthest: usize,
    active: BTreeSet<Active>,
}

impl<'a, S: Scheduler> Runtime<'a, S> {
    pub(super) fn new(
        grammar: &'a Arc<GrammarGraph>,
        config: &'a ParserConfig,
        input: &'a Input,
        scheduler: S,
    ) -> Self {
        Self {
            grammar,
            config,
            input,
            scheduler,
            gss: Gss::new(),
            forest: Forest::new(Arc::clone(grammar)),
            furthest: 0,
            active: BTreeSet::new(),
        }
    }

    pub(super) fn run(mut self, start: HeadId, args: &[Value]) -> Result<ParseResult, GllError> {
        let data: GssData = args.iter().cloned().collect();
        let env = self.callee_env(start, &data);
        let (root, _) = self.gss.get_or_create(start, 0, data);
        self.call_head(start, root, 0, &env);
        self.check_limits()?;

        while let Some(descriptor) = self.scheduler.next() {
            tracing::trace!(
                slot = %self.grammar.slot(descriptor.slot).label,
                gss = descriptor.gss.0,
                position = descriptor.position,
                "descriptor"
            );
            self.execute(descriptor);
            self.check_limits()?;
        }

        Ok(self.finish(start))
    }

    fn finish(self, start: HeadId) -> ParseResult {
        let counts = self.forest.counts();
        let statistics = ParseStatistics {
            descriptors: self.scheduler.total(),
            gss_nodes: self.gss.node_count(),
            gss_edges: self.gss.edge_count(),
            nonterminal_nodes: counts.nonterminal,
            intermediate_nodes: counts.intermediate,
            terminal_nodes: counts.terminal,
            packed_nodes: counts.packed,
            ambiguous_nodes: counts.ambiguous,
        };

        match self.forest.find_nonterminal(start, 0, self.input.len()) {
            Some(root) => ParseResult::Success(ParseSuccess {
                root,
                forest: self.forest,
                statistics,
            }),
            None => {
                let grammar = self.grammar;
                let active_slots = self
                    .active
                    .iter()
                    .map(|active| match *active {
                        Active::Head(head) => grammar.head(head).name.clone(),
                        Active::Slot(slot) => grammar.slot(slot).label.clone(),
                    })
                    .collect();
                ParseResult::Failure(ParseFailure {
                    position: self.furthest,
                    active_slots,
                    statistics,
                })
            }
        }
    }

    fn check_limits(&self) -> Result<(), GllError> {
        let limits = &self.config.limits;
        let checks = [
            (Resource::Descriptors, limits.max_descriptors, self.scheduler.total()),
            (Resource::GssNodes, limits.max_gss_nodes, self.gss.node_count()),
            (Resource::SppfNodes, limits.max_sppf_nodes, self.forest.len()),
        ];
        for (resource, limit, used) in checks {
            if let Some(limit) = limit
                && used > limit
            {
                tracing::warn!(%resource, limit, "resource limit exceeded, aborting parse");
                return Err(GllError::ResourceExhausted { resource, limit });
            }
        }
        Ok(())
    }

    fn record(&mut self, position: usize, active: Active) {
        if position == self.furthest {
            self.active.insert(active);
        }
    }

    fn reach(&mut self, right: usize) {
        if right > self.furthest {
            self.furthest = right;
            self.active.clear();
        }
    }

    fn schedule(&mut self, descriptor: Descriptor) {
        self.scheduler.add(descriptor);
    }

    fn callee_env(&self, head: HeadId, data: &GssData) -> Environment {
        self.grammar
            .head(head)
            .params
            .iter()
            .zip(data)
            .fold(Environment::new(), |env, (param, value)| {
                env.bind(param.clone(), value.clone())
            })
    }

    /// Schedule the first slot of every alternative of `head` admitted at `position`.
    fn call_head(&mut self, head: HeadId, gss: GssId, position: usize, env: &Environment) {
        let grammar = self.grammar;
        let head_slot = grammar.head(head);
        self.record(position, Active::Head(head));

        if self.config.lookahead {
            let lookahead = self.input.char_at(position);
            for &alternative in head_slot.prediction.admitted(lookahead) {
                let slot = head_slot.first_slots[usize::from(alternative)];
                self.schedule(Descriptor {
                    slot,
                    gss,
                    position,
                    node: None,
                    env: env.clone(),
                });
            }
        } else {
            for &slot in &head_slot.first_slots {
                self.schedule(Descriptor {
                    slot,
                    gss,
                    position,
                    node: None,
                    env: env.clone(),
                });
            }
        }
    }

    /// Run slots from `descriptor` until a call, a pop or a failed test.
    ///
    /// Terminal slots continue directly with the next slot of the same
    /// alternative instead of scheduling a descriptor.
    fn execute(&mut self, descriptor: Descriptor) {
        let grammar = self.grammar;
        let input = self.input;
        let Descriptor {
            mut slot,
            gss,
            mut position,
            mut node,
            mut env,
        } = descriptor;

        loop {
            let body = grammar.slot(slot);
            self.record(position, Active::Slot(slot));
            if !all_hold(&body.pre, input, position, position, &env) {
                return;
            }

            match &body.kind {
                SlotKind::Terminal(terminal) => {
                    let Some(len) = grammar.terminal(*terminal).matcher.match_at(input, position)
                    else {
                        return;
                    };
                    let right = position + len;
                    self.reach(right);
                    let leaf = self.forest.terminal_node(*terminal, position, right);
                    let next = SlotId(slot.0 + 1);
                    let Some((next_node, next_env)) = self.advance(next, node, leaf, env) else {
                        return;
                    };
                    slot = next;
                    position = right;
                    node = Some(next_node);
                    env = next_env;
                }
                SlotKind::Call { head, args } => {
                    let data: GssData = args.iter().map(|arg| arg.eval(&env, input)).collect();
                    let edge = GssEdge {
                        return_slot: SlotId(slot.0 + 1),
                        dest: gss,
                        node,
                        env,
                    };
                    self.create_edge(*head, position, data, edge);
                    return;
                }
                SlotKind::Last => {
                    let child = match node {
                        Some(child) => child,
                        None => self.forest.epsilon_node(position),
                    };
                    self.pop(gss, slot, position, child);
                    return;
                }
            }
        }
    }

    /// Move past a recognized symbol `z` into `slot`.
    ///
    /// Applies the follow test, binds the symbol's label, checks its
    /// post-conditions and builds the SPPF node for `slot` from `w` and `z`.
    fn advance(
        &mut self,
        slot: SlotId,
        w: Option<NodeId>,
        z: NodeId,
        env: Environment,
    ) -> Option<(NodeId, Environment)> {
        let grammar = self.grammar;
        let body = grammar.slot(slot);
        let left = self.forest.left_extent(z);
        let right = self.forest.right_extent(z);
        self.record(right, Active::Slot(slot));

        if self.config.lookahead && !body.follow.accepts(self.input.char_at(right)) {
            return None;
        }
        let env = match &body.binding {
            Some(label) => env.bind(label.clone(), Value::Span { start: left, end: right }),
            None => env,
        };
        if !all_hold(&body.post, self.input, left, right, &env) {
            return None;
        }
        Some((self.node_for(slot, w, z, left, right), env))
    }

    fn node_for(&mut self, slot: SlotId, w: Option<NodeId>, z: NodeId, left: usize, right: usize) -> NodeId {
        match self.grammar.slot(slot).node_kind {
            NodeKind::PassThrough => z,
            NodeKind::Intermediate => {
                debug_assert!(w.is_some(), "intermediate slot without a left node");
                let Some(w) = w else {
                    return z;
                };
                let start = self.forest.left_extent(w);
                let parent = self.forest.intermediate_node(slot, start, right);
                self.forest.add_packed(parent, slot, left, w, Some(z));
                parent
            }
            NodeKind::Dummy => {
                debug_assert!(false, "advanced into a position 0 slot");
                z
            }
        }
    }

    /// Resume a caller along `edge` after its callee recognized `z`.
    fn return_to(&mut self, edge: &GssEdge, z: NodeId) {
        let right = self.forest.right_extent(z);
        if let Some((node, env)) = self.advance(edge.return_slot, edge.node, z, edge.env.clone()) {
            self.schedule(Descriptor {
                slot: edge.return_slot,
                gss: edge.dest,
                position: right,
                node: Some(node),
                env,
            });
        }
    }

    fn create_edge(&mut self, head: HeadId, position: usize, data: GssData, edge: GssEdge) {
        let env = self.callee_env(head, &data);
        let (callee, created) = self.gss.get_or_create(head, position, data);
        self.gss.add_edge(callee, edge.clone());

        let popped: Vec<NodeId> = self.gss.node(callee).popped().map(|(_, node)| node).collect();
        for z in popped {
            self.return_to(&edge, z);
        }

        if created {
            self.call_head(head, callee, position, &env);
        }
    }

    fn pop(&mut self, gss: GssId, slot: SlotId, position: usize, child: NodeId) {
        let node = self.gss.node(gss);
        let (head, left) = (node.head, node.position);
        let parent = self.forest.nonterminal_node(head, left, position);
        self.forest.add_packed(parent, slot, position, child, None);

        if !self.gss.insert_popped(gss, position, parent) {
            return;
        }
        let edges = self.gss.node(gss).edges().to_vec();
        for edge in &edges {
            self.return_to(edge, parent);
        }
    }
}
