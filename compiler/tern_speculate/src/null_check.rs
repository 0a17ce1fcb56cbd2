//! Explicit null checks.

use tern_ir::{Graph, GraphError, NodeId, NodeKind};

use crate::canonicalize::{Canonical, Canonicalizable};
use crate::context::CompileContext;
use crate::error::SpeculationError;

/// View of a live `NullCheck` node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NullCheckNode {
    id: NodeId,
}

impl NullCheckNode {
    pub fn of(graph: &Graph, id: NodeId) -> Result<Self, SpeculationError> {
        if !graph.is_alive(id) {
            return Err(GraphError::DeadNode(id).into());
        }
        match *graph.kind(id) {
            NodeKind::NullCheck => Ok(NullCheckNode { id }),
            other => Err(SpeculationError::UnexpectedNode {
                node: id,
                expected: "NullCheck",
                found: other.name(),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn object(&self, graph: &Graph) -> Option<NodeId> {
        graph.inputs(self.id).first().copied()
    }
}

impl Canonicalizable for NullCheckNode {
    /// A check on a value proven non-null is dropped.
    fn canonical(
        &self,
        graph: &mut Graph,
        _cx: &mut CompileContext<'_>,
    ) -> Result<Canonical, SpeculationError> {
        match self.object(graph) {
            Some(object) if !graph.stamp(object).may_be_null() => Ok(Canonical::Removed),
            _ => Ok(Canonical::Unchanged),
        }
    }
}
