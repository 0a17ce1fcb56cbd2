//! The single lowering decision for a speculative call node.
//!
//! Folds if the call site resolves; the node is then replaced by the
//! constant and leaves no trace on the control chain. Otherwise the node
//! becomes the generic invoke it stands for, in the same control slot, and
//! that invoke is lowered right away.

use tern_ir::Graph;

use crate::call_site_target::CallSiteTargetNode;
use crate::context::CompileContext;
use crate::error::SpeculationError;
use crate::macros;
use crate::state::Replacement;

use super::{InvokeNode, Lowerable, Lowered};

/// Lower `node` to its folded target or to a call.
pub fn lower_call_site_target(
    node: CallSiteTargetNode,
    graph: &mut Graph,
    cx: &mut CompileContext<'_>,
) -> Result<Lowered, SpeculationError> {
    let id = node.id();
    cx.log.begin_lowering(id)?;

    if let Some(folded) = node.try_fold(graph, cx)? {
        let constant = folded.commit(graph);
        graph.replace_fixed_with_floating(id, constant)?;
        cx.log.replaced(id, Replacement::Constant)?;
        tracing::debug!(node = ?id, target = %folded.constant, "folded at lowering");
        return Ok(Lowered::Constant(constant));
    }

    let invoke = macros::create_invoke(graph, id, node.descriptor());
    graph.replace_fixed_with_fixed(id, invoke)?;
    cx.log.replaced(id, Replacement::Dispatch)?;
    tracing::debug!(node = ?id, ?invoke, "lowered to dispatch");
    InvokeNode::of(graph, invoke)?.lower(graph, cx)
}
