//! Descriptors and the worklist that drives a parse.
//!
//! A descriptor is a unit of pending work: resume `slot` on behalf of the
//! GSS node `gss`, at input position `position`, with the SPPF node built so
//! far and the current environment. Each distinct descriptor is processed at
//! most once per parse; the scheduler owns the set that enforces this.

use crate::env::Environment;
use crate::grammar::SlotId;
use crate::gss::GssId;
use crate::sppf::NodeId;
use hashbrown::HashSet;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    pub slot: SlotId,
    pub gss: GssId,
    pub position: usize,
    /// `None` is the dummy node of a slot at position 0.
    pub node: Option<NodeId>,
    pub env: Environment,
}

/// A worklist of descriptors with set semantics over everything ever added.
pub trait Scheduler {
    /// Schedule `descriptor` unless an equal one was added before.
    fn add(&mut self, descriptor: Descriptor) -> bool;

    fn next(&mut self) -> Option<Descriptor>;

    /// Number of descriptors waiting to be processed.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct descriptors added since the last clear.
    fn total(&self) -> usize;

    fn clear(&mut self);
}

/// Processes the most recently added descriptor first.
#[derive(Debug, Default)]
pub struct StackScheduler {
    pending: Vec<Descriptor>,
    seen: HashSet<Descriptor>,
}

impl StackScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for StackScheduler {
    fn add(&mut self, descriptor: Descriptor) -> bool {
        if !self.seen.insert(descriptor.clone()) {
            return false;
        }
        self.pending.push(descriptor);
        true
    }

    fn next(&mut self) -> Option<Descriptor> {
        self.pending.pop()
    }

    fn len(&self) -> usize {
        self.pending.len()
    }

    fn total(&self) -> usize {
        self.seen.len()
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.seen.clear();
    }
}

/// Processes descriptors in the order they were added.
#[derive(Debug, Default)]
pub struct QueueScheduler {
    pending: VecDeque<Descriptor>,
    seen: HashSet<Descriptor>,
}

impl QueueScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for QueueScheduler {
    fn add(&mut self, descriptor: Descriptor) -> bool {
        if !self.seen.insert(descriptor.clone()) {
            return false;
        }
        self.pending.push_back(descriptor);
        true
    }

    fn next(&mut self) -> Option<Descriptor> {
        self.pending.pop_front()
    }

    fn len(&self) -> usize {
        self.pending.len()
    }

    fn total(&self) -> usize {
        self.seen.len()
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(slot: u32, position: usize) -> Descriptor {
        Descriptor {
            slot: SlotId(slot),
            gss: GssId(0),
            position,
            node: None,
            env: Environment::new(),
        }
    }

    #[test]
    fn test_stack_is_lifo() {
        let mut scheduler = StackScheduler::new();
        assert!(scheduler.add(descriptor(0, 0)));
        assert!(scheduler.add(descriptor(1, 0)));
        assert_eq!(scheduler.next().map(|d| d.slot), Some(SlotId(1)));
        assert_eq!(scheduler.next().map(|d| d.slot), Some(SlotId(0)));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut scheduler = QueueScheduler::new();
        scheduler.add(descriptor(0, 0));
        scheduler.add(descriptor(1, 0));
        assert_eq!(scheduler.next().map(|d| d.slot), Some(SlotId(0)));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_processed_descriptors_are_not_readded() {
        let mut scheduler = QueueScheduler::new();
        assert!(scheduler.add(descriptor(0, 2)));
        scheduler.next();
        assert!(!scheduler.add(descriptor(0, 2)));
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.total(), 1);

        scheduler.clear();
        assert!(scheduler.add(descriptor(0, 2)));
    }
}
