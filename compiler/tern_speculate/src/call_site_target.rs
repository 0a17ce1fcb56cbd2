//! The speculative `CallSite.getTarget()` node.
//!
//! Reads the current target of a call site. If the call site is a constant
//! whose target is bound, the read folds to that target under an
//! assumption that the binding does not change. Otherwise the node stays
//! until lowering, which turns it into the call it stands for.

use tern_ir::{CallDescriptor, Graph, NodeId, NodeKind};

use crate::canonicalize::{Canonical, Canonicalizable};
use crate::context::CompileContext;
use crate::error::SpeculationError;
use crate::fold::{self, FoldedTarget};
use crate::lowering::{dispatch, Lowerable, Lowered};

/// View of a live `CallSiteTarget` node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallSiteTargetNode {
    id: NodeId,
    descriptor: CallDescriptor,
}

impl CallSiteTargetNode {
    /// View `id` as a call-site target node.
    pub fn of(graph: &Graph, id: NodeId) -> Result<Self, SpeculationError> {
        if !graph.is_alive(id) {
            return Err(SpeculationError::AlreadyReplaced { node: id });
        }
        match *graph.kind(id) {
            NodeKind::CallSiteTarget(descriptor) => Ok(CallSiteTargetNode { id, descriptor }),
            other => Err(SpeculationError::UnexpectedNode {
                node: id,
                expected: "CallSiteTarget",
                found: other.name(),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The call this node falls back to.
    pub fn descriptor(&self) -> CallDescriptor {
        self.descriptor
    }

    /// The call-site operand (the receiver of `getTarget`).
    pub fn call_site(&self, graph: &Graph) -> Option<NodeId> {
        graph.inputs(self.id).first().copied()
    }

    /// Fold attempt against this compilation's binding snapshot.
    pub fn try_fold(
        &self,
        graph: &Graph,
        cx: &mut CompileContext<'_>,
    ) -> Result<Option<FoldedTarget>, SpeculationError> {
        if !cx.config.fold_call_site_targets {
            return Ok(None);
        }
        fold::try_fold(graph, self.call_site(graph), cx.providers, &mut cx.snapshot)
    }
}

impl Canonicalizable for CallSiteTargetNode {
    fn canonical(
        &self,
        graph: &mut Graph,
        cx: &mut CompileContext<'_>,
    ) -> Result<Canonical, SpeculationError> {
        cx.log.begin_canonicalize(self.id)?;
        if let Some(folded) = self.try_fold(graph, cx)? {
            let constant = folded.commit(graph);
            tracing::debug!(
                node = ?self.id,
                target = %folded.constant,
                "folded call-site target"
            );
            Ok(Canonical::Floating(constant))
        } else {
            cx.log.unresolved(self.id)?;
            Ok(Canonical::Unchanged)
        }
    }
}

impl Lowerable for CallSiteTargetNode {
    fn lower(
        &self,
        graph: &mut Graph,
        cx: &mut CompileContext<'_>,
    ) -> Result<Lowered, SpeculationError> {
        dispatch::lower_call_site_target(*self, graph, cx)
    }
}
