//! Canonicalization: optimistic, repeatable graph simplification.
//!
//! Nodes that can simplify themselves implement [`Canonicalizable`]. A hook
//! only inspects the node and says what it should become; the driver
//! performs the replacement. Hooks may add floating nodes and record
//! assumptions, nothing else.
//!
//! The driver runs a worklist to a fixpoint. After each replacement, the
//! replaced node's usages are revisited, since a new constant input may
//! let them simplify in turn.

use rustc_hash::FxHashSet;
use tern_ir::{Graph, NodeId, NodeKind};

use crate::call_site_target::CallSiteTargetNode;
use crate::context::CompileContext;
use crate::error::SpeculationError;
use crate::null_check::NullCheckNode;
use crate::state::Replacement;

/// What a canonicalization hook wants done with its node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Canonical {
    /// Keep the node as it is.
    Unchanged,
    /// Replace the node by this floating node.
    Floating(NodeId),
    /// Drop the node; nothing uses it.
    Removed,
}

/// A node that can simplify itself during canonicalization.
pub trait Canonicalizable {
    /// Decide what the node should become. Calling this again without an
    /// intervening graph change gives the same answer.
    fn canonical(
        &self,
        graph: &mut Graph,
        cx: &mut CompileContext<'_>,
    ) -> Result<Canonical, SpeculationError>;
}

fn is_canonicalizable(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::CallSiteTarget(_) | NodeKind::NullCheck)
}

/// Run one canonicalization hook for `node`, if its kind has one.
pub fn canonical_for(
    graph: &mut Graph,
    node: NodeId,
    cx: &mut CompileContext<'_>,
) -> Result<Canonical, SpeculationError> {
    match *graph.kind(node) {
        NodeKind::CallSiteTarget(_) => CallSiteTargetNode::of(graph, node)?.canonical(graph, cx),
        NodeKind::NullCheck => NullCheckNode::of(graph, node)?.canonical(graph, cx),
        _ => Ok(Canonical::Unchanged),
    }
}

/// Canonicalize `graph` to a fixpoint. Returns the number of replacements.
pub fn canonicalize(
    graph: &mut Graph,
    cx: &mut CompileContext<'_>,
) -> Result<usize, SpeculationError> {
    let limit = cx.config.max_canonicalizer_rounds;
    let mut worklist: Vec<NodeId> = graph
        .fixed_chain()
        .into_iter()
        .filter(|&n| is_canonicalizable(graph.kind(n)))
        .collect();
    let mut rounds = 0;
    let mut changes = 0;

    while !worklist.is_empty() {
        if rounds == limit {
            tracing::debug!(rounds, pending = worklist.len(), "canonicalizer gave up");
            return Err(SpeculationError::CanonicalizerDiverged { rounds });
        }
        rounds += 1;

        let mut next = Vec::new();
        let mut queued = FxHashSet::default();
        for node in worklist.drain(..) {
            if !graph.is_alive(node) {
                continue;
            }
            match canonical_for(graph, node, cx)? {
                Canonical::Unchanged => {}
                Canonical::Floating(replacement) => {
                    let users: Vec<NodeId> = graph.usages(node).to_vec();
                    graph.replace_fixed_with_floating(node, replacement)?;
                    cx.log.replaced(node, Replacement::Constant)?;
                    tracing::debug!(?node, ?replacement, "replaced with floating node");
                    changes += 1;
                    for user in users {
                        if is_canonicalizable(graph.kind(user)) && queued.insert(user) {
                            next.push(user);
                        }
                    }
                }
                Canonical::Removed => {
                    graph.remove_fixed(node)?;
                    cx.log.stats_mut().null_checks_removed += 1;
                    tracing::debug!(?node, "removed");
                    changes += 1;
                }
            }
        }
        worklist = next;
    }

    tracing::debug!(rounds, changes, "canonicalization done");
    Ok(changes)
}
