//! Lowering of generic invokes to low-level calls.

use smallvec::SmallVec;
use tern_ir::{
    CallDescriptor, CallTarget, Dispatch, Graph, GraphError, NodeId, NodeKind, Stamp,
};

use crate::context::CompileContext;
use crate::error::SpeculationError;

use super::{Lowerable, Lowered};

/// View of a live `Invoke` node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvokeNode {
    id: NodeId,
    descriptor: CallDescriptor,
}

impl InvokeNode {
    pub fn of(graph: &Graph, id: NodeId) -> Result<Self, SpeculationError> {
        if !graph.is_alive(id) {
            return Err(GraphError::DeadNode(id).into());
        }
        match *graph.kind(id) {
            NodeKind::Invoke(descriptor) => Ok(InvokeNode { id, descriptor }),
            other => Err(SpeculationError::UnexpectedNode {
                node: id,
                expected: "Invoke",
                found: other.name(),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The receiver argument, if the call has one.
    pub fn receiver(&self, graph: &Graph) -> Option<NodeId> {
        if self.descriptor.invoke_kind.has_receiver() {
            graph.inputs(self.id).first().copied()
        } else {
            None
        }
    }
}

impl Lowerable for InvokeNode {
    /// Guard a possibly-null receiver with an explicit check, bind the call
    /// directly when the receiver's class is exact, and put the `Call` in
    /// the invoke's slot.
    fn lower(
        &self,
        graph: &mut Graph,
        cx: &mut CompileContext<'_>,
    ) -> Result<Lowered, SpeculationError> {
        let receiver = self.receiver(graph);
        let receiver_stamp = receiver.map_or(Stamp::Void, |r| graph.stamp(r));

        if let Some(receiver) = receiver.filter(|_| receiver_stamp.may_be_null()) {
            let check = graph.add_fixed(NodeKind::NullCheck, Stamp::Void, &[receiver]);
            graph.insert_before(self.id, check)?;
            cx.log.stats_mut().null_checks_inserted += 1;
        }

        let dispatch = match receiver_stamp.exact_type() {
            Some(receiver_type) => {
                cx.log.stats_mut().devirtualized += 1;
                Dispatch::Direct { receiver_type }
            }
            None => Dispatch::Virtual,
        };
        let target = CallTarget {
            method: self.descriptor.method,
            dispatch,
            bci: self.descriptor.bci,
        };
        let args: SmallVec<[NodeId; 4]> = graph.inputs(self.id).iter().copied().collect();
        let stamp = graph.stamp(self.id);
        let call = graph.add_fixed(NodeKind::Call(target), stamp, &args);
        graph.replace_fixed_with_fixed(self.id, call)?;
        tracing::debug!(invoke = ?self.id, ?call, ?dispatch, "lowered invoke");
        Ok(Lowered::Dispatch(call))
    }
}
