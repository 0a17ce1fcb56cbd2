//! Lowering: mandatory replacement of high-level nodes before code
//! generation.
//!
//! Every `HIGH_LEVEL` fixed node is lowered exactly once, in control
//! order. Lowering a node may create new high-level nodes (a
//! `CallSiteTarget` that does not fold becomes an `Invoke`); those are
//! lowered on the spot by the hook that created them. After the phase no
//! high-level node may remain.

pub mod dispatch;
pub mod invoke;

use tern_ir::{Graph, NodeFlags, NodeId, NodeKind};

use crate::call_site_target::CallSiteTargetNode;
use crate::context::CompileContext;
use crate::error::SpeculationError;

pub use invoke::InvokeNode;

/// What a lowered node was replaced by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lowered {
    /// A floating constant.
    Constant(NodeId),
    /// A low-level call in the node's control slot.
    Dispatch(NodeId),
}

impl Lowered {
    pub fn node(self) -> NodeId {
        match self {
            Lowered::Constant(node) | Lowered::Dispatch(node) => node,
        }
    }
}

/// A high-level node that knows how to lower itself.
pub trait Lowerable {
    /// Replace the node with primitives. Runs once per node.
    fn lower(
        &self,
        graph: &mut Graph,
        cx: &mut CompileContext<'_>,
    ) -> Result<Lowered, SpeculationError>;
}

/// Lower one high-level node.
pub fn lower_node(
    graph: &mut Graph,
    node: NodeId,
    cx: &mut CompileContext<'_>,
) -> Result<Lowered, SpeculationError> {
    match *graph.kind(node) {
        NodeKind::CallSiteTarget(_) => CallSiteTargetNode::of(graph, node)?.lower(graph, cx),
        NodeKind::Invoke(_) => InvokeNode::of(graph, node)?.lower(graph, cx),
        other => Err(SpeculationError::UnexpectedNode {
            node,
            expected: "high-level node",
            found: other.name(),
        }),
    }
}

/// Lower every high-level node in `graph`. Returns how many were lowered.
pub fn lower(graph: &mut Graph, cx: &mut CompileContext<'_>) -> Result<usize, SpeculationError> {
    let pending: Vec<NodeId> = graph
        .fixed_chain()
        .into_iter()
        .filter(|&n| is_high_level(graph, n))
        .collect();
    for &node in &pending {
        let lowered = lower_node(graph, node, cx)?;
        tracing::trace!(?node, ?lowered, "lowered");
    }
    check_lowered(graph)?;
    tracing::debug!(lowered = pending.len(), "lowering done");
    Ok(pending.len())
}

/// Fail if any high-level node is still alive.
pub fn check_lowered(graph: &Graph) -> Result<(), SpeculationError> {
    match graph.live_nodes().find(|&n| is_high_level(graph, n)) {
        Some(node) => Err(SpeculationError::Unlowered {
            node,
            kind: graph.kind(node).name(),
        }),
        None => Ok(()),
    }
}

fn is_high_level(graph: &Graph, node: NodeId) -> bool {
    graph.kind(node).flags().contains(NodeFlags::HIGH_LEVEL)
}

#[cfg(test)]
mod tests;
