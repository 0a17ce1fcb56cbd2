//! Errors that abort the compilation of a unit.
//!
//! "Not foldable" is never an error: it is `Ok(None)` from the folder.
//! Everything here means an upstream stage or the driver is broken, so the
//! unit is abandoned and the runtime keeps running it unoptimized.

use tern_ir::{Assumption, Constant, GraphError, NodeId, ReflectionError};

use crate::state::Resolution;

/// Fatal defect found while speculating on a unit.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpeculationError {
    /// A constant used as a call site cannot be read as one.
    #[error("call-site operand {node:?} holds {constant}, which is not a readable call site")]
    TypeConfusion {
        node: NodeId,
        constant: Constant,
        #[source]
        source: Option<ReflectionError>,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A node view was requested for a node of another kind.
    #[error("{node:?} is a {found} node, expected {expected}")]
    UnexpectedNode {
        node: NodeId,
        expected: &'static str,
        found: &'static str,
    },

    /// A high-level node survived the lowering phase.
    #[error("{node:?} ({kind}) is still in the graph after lowering")]
    Unlowered { node: NodeId, kind: &'static str },

    #[error("canonicalization did not reach a fixpoint within {rounds} rounds")]
    CanonicalizerDiverged { rounds: usize },

    /// A hook ran on a node that has already been replaced.
    #[error("{node:?} was already replaced")]
    AlreadyReplaced { node: NodeId },

    /// A node moved through its resolution states out of order.
    #[error("{node:?} cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        node: NodeId,
        from: Resolution,
        to: Resolution,
    },

    /// The runtime no longer satisfies a fact the unit was compiled under.
    #[error("assumption no longer holds: {0:?}")]
    InvalidatedAssumption(Assumption),

    #[cfg(feature = "cache")]
    #[error("assumption cache: {0}")]
    Cache(String),
}
