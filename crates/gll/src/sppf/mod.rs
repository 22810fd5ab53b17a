//! Shared packed parse forest
//!
//! This module provides the binarized SPPF built during a parse. Symbol
//! nodes (nonterminal and intermediate) are shared by extent; their
//! derivations are packed nodes with at most two children. The forest is
//! read-only once a parse returns.

mod forest;
mod node;

pub use forest::{Forest, NodeCounts, PackedChildren};
pub use node::{Alternatives, NodeId, PackedNode, SppfNode};
