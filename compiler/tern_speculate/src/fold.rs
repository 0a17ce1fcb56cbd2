//! Constant folding of `CallSite.getTarget()`.
//!
//! [`try_fold`] resolves the current target of a constant call site. It is
//! pure: the graph and the assumption registry are left untouched, and the
//! fact the fold depends on comes back inside the [`FoldedTarget`]. Whoever
//! acts on the fold calls [`FoldedTarget::commit`] to record that fact and
//! get the constant node.
//!
//! Whether a fact can be recorded is a property of the graph: a graph
//! without an assumption registry only folds call sites that can never be
//! re-bound.

use tern_ir::{
    constant_stamp, Assumption, Constant, Graph, GraphError, NodeId, NodeKind, Stamp,
};

use crate::context::Providers;
use crate::error::SpeculationError;
use crate::snapshot::BindingSnapshot;

/// A successful fold, not yet applied to the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoldedTarget {
    /// The resolved target.
    pub constant: Constant,
    pub stamp: Stamp,
    /// The fact the fold is only valid under. `None` when the call site is
    /// immutable and the graph keeps no registry.
    pub assumption: Option<Assumption>,
}

impl FoldedTarget {
    /// Record the assumption (if any) and intern the constant node.
    pub fn commit(&self, graph: &mut Graph) -> NodeId {
        if let (Some(assumption), Some(registry)) = (self.assumption, graph.assumptions_mut()) {
            if registry.record(assumption) {
                tracing::debug!(?assumption, "assumption recorded");
            }
        }
        graph.unique_constant(self.constant, self.stamp)
    }
}

/// Try to resolve the target of the call site held by `call_site`.
///
/// Returns `Ok(None)` when the operand is absent, not a constant, the null
/// constant, or a call site with no target bound yet. A constant that is
/// not a readable call site is a [`SpeculationError::TypeConfusion`].
pub fn try_fold(
    graph: &Graph,
    call_site: Option<NodeId>,
    providers: Providers<'_>,
    snapshot: &mut BindingSnapshot,
) -> Result<Option<FoldedTarget>, SpeculationError> {
    let Some(node) = call_site else {
        return Ok(None);
    };
    if !graph.is_alive(node) {
        return Err(GraphError::DeadNode(node).into());
    }
    let NodeKind::Constant(constant) = *graph.kind(node) else {
        return Ok(None);
    };
    let object = match constant {
        Constant::Null => return Ok(None),
        Constant::Int(_) => {
            return Err(SpeculationError::TypeConfusion {
                node,
                constant,
                source: None,
            })
        }
        Constant::Object(object) => object,
    };

    let binding = snapshot
        .binding(providers.reflection, object)
        .map_err(|source| SpeculationError::TypeConfusion {
            node,
            constant,
            source: Some(source),
        })?;
    let Some(target) = binding.target else {
        tracing::trace!(call_site = ?object, "call site not linked yet");
        return Ok(None);
    };

    let assumption = if graph.assumptions().is_some() {
        Some(Assumption::CallSiteTargetValue {
            call_site: object,
            target,
        })
    } else if binding.kind.is_rebindable() {
        tracing::trace!(call_site = ?object, "no registry for a re-bindable call site");
        return Ok(None);
    } else {
        None
    };

    let constant = Constant::Object(target);
    Ok(Some(FoldedTarget {
        constant,
        stamp: constant_stamp(providers.meta, constant),
        assumption,
    }))
}

#[cfg(test)]
mod tests;
