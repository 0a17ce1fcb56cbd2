//! Expansion of macro nodes into the calls they stand for.
//!
//! A macro node is a high-level node that replaces a call during graph
//! construction so it can be optimized specially. It keeps the call's
//! [`CallDescriptor`] and arguments, so it can always be turned back into
//! the generic call.

use smallvec::SmallVec;
use tern_ir::{CallDescriptor, Graph, NodeId, NodeKind};

/// Build the generic `Invoke` for `macro_node`, with the same arguments
/// and result stamp. The invoke is not linked into the control chain.
pub fn create_invoke(graph: &mut Graph, macro_node: NodeId, descriptor: CallDescriptor) -> NodeId {
    let args: SmallVec<[NodeId; 4]> = graph.inputs(macro_node).iter().copied().collect();
    let stamp = graph.stamp(macro_node);
    let invoke = graph.add_fixed(NodeKind::Invoke(descriptor), stamp, &args);
    tracing::trace!(?macro_node, ?invoke, method = descriptor.method.name(), "created invoke");
    invoke
}
