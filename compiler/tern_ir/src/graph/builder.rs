//! Straight-line graph construction.
//!
//! Follows the "position, emit, terminate" pattern: every fixed node is
//! appended after the previously emitted one, so the control chain comes
//! out in emission order. Floating nodes are created on demand.

use crate::constant::Constant;
use crate::node::{CallDescriptor, InvokeKind, MethodRef, NodeId, NodeKind};
use crate::stamp::Stamp;

use super::{Graph, GraphError};

/// Builder for a straight-line graph.
pub struct GraphBuilder {
    graph: Graph,
    last: NodeId,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Start building a graph with assumptions enabled.
    pub fn new() -> Self {
        Self::on(Graph::new())
    }

    /// Start building a graph that may not record assumptions.
    pub fn without_assumptions() -> Self {
        Self::on(Graph::without_assumptions())
    }

    fn on(graph: Graph) -> Self {
        let last = graph.start();
        Self { graph, last }
    }

    /// The graph built so far.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Incoming argument `index`.
    pub fn parameter(&mut self, index: u32, stamp: Stamp) -> NodeId {
        self.graph
            .add_floating(NodeKind::Parameter { index }, stamp, &[])
    }

    /// Interned constant.
    pub fn constant(&mut self, constant: Constant, stamp: Stamp) -> NodeId {
        self.graph.unique_constant(constant, stamp)
    }

    /// Append a fixed node after the last one emitted.
    pub fn emit_fixed(
        &mut self,
        kind: NodeKind,
        stamp: Stamp,
        inputs: &[NodeId],
    ) -> Result<NodeId, GraphError> {
        let id = self.graph.add_fixed(kind, stamp, inputs);
        self.graph.append(self.last, id)?;
        self.last = id;
        Ok(id)
    }

    /// Emit the speculative `CallSite.getTarget()` intrinsic on `call_site`.
    pub fn call_site_target(&mut self, call_site: NodeId, bci: u32) -> Result<NodeId, GraphError> {
        let descriptor = CallDescriptor {
            method: MethodRef::CallSiteGetTarget,
            invoke_kind: InvokeKind::Virtual,
            bci,
        };
        self.emit_fixed(
            NodeKind::CallSiteTarget(descriptor),
            Stamp::object(),
            &[call_site],
        )
    }

    /// Write `value` to the observable slot `slot`.
    pub fn store(&mut self, slot: u32, value: NodeId) -> Result<NodeId, GraphError> {
        self.emit_fixed(NodeKind::Store { slot }, Stamp::Void, &[value])
    }

    /// Terminate the chain by returning `value`.
    pub fn ret(&mut self, value: NodeId) -> Result<NodeId, GraphError> {
        self.emit_fixed(NodeKind::Return, Stamp::Void, &[value])
    }

    /// Finish building.
    pub fn finish(self) -> Graph {
        self.graph
    }
}
