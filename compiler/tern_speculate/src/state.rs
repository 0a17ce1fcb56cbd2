//! Resolution states of speculative call nodes.
//!
//! ```text
//!              ┌──────────── no fold ────────────┐
//!              ▼                                 │
//!   Unresolved ──visit──► Canonicalizing ────────┘
//!       │                      │ fold
//!       │                      ▼
//!       │               ReplacedConstant
//!       │                      ▲ fold
//!       └──lower──► Lowering ──┤
//!                              ▼ no fold
//!                       ReplacedDispatch
//! ```
//!
//! Both `Replaced*` states are terminal: the node is dead in the graph.
//! The log rejects any transition out of them.

use rustc_hash::FxHashMap;
use tern_ir::NodeId;

use crate::error::SpeculationError;

/// Where a speculative call node is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Resolution {
    #[default]
    Unresolved,
    /// Being visited by the canonicalizer. A node stays here between a
    /// successful fold and the replacement the driver applies for it.
    Canonicalizing,
    /// Being lowered.
    Lowering,
    ReplacedConstant,
    ReplacedDispatch,
}

impl Resolution {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Resolution::ReplacedConstant | Resolution::ReplacedDispatch
        )
    }
}

/// What a speculative call node was replaced by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Replacement {
    /// The folded target constant (floating replacement).
    Constant,
    /// A real dispatch in the node's control slot (fixed replacement).
    Dispatch,
}

/// Counters for one compilation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpeculationStats {
    /// Canonicalizer visits of call-site target nodes.
    pub canonicalize_visits: u32,
    pub folded_in_canonicalize: u32,
    pub folded_in_lowering: u32,
    pub lowered_to_dispatch: u32,
    pub null_checks_inserted: u32,
    pub null_checks_removed: u32,
    /// Calls lowered to a direct call on an exactly known receiver class.
    pub devirtualized: u32,
}

impl SpeculationStats {
    /// Total successful folds.
    pub fn folds(&self) -> u32 {
        self.folded_in_canonicalize + self.folded_in_lowering
    }
}

/// Per-node resolution states plus the unit's counters.
#[derive(Clone, Debug, Default)]
pub struct ResolutionLog {
    states: FxHashMap<NodeId, Resolution>,
    stats: SpeculationStats,
}

impl ResolutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `node`; nodes never seen are `Unresolved`.
    pub fn state(&self, node: NodeId) -> Resolution {
        self.states.get(&node).copied().unwrap_or_default()
    }

    pub fn stats(&self) -> SpeculationStats {
        self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut SpeculationStats {
        &mut self.stats
    }

    /// The canonicalizer starts visiting `node`.
    pub fn begin_canonicalize(&mut self, node: NodeId) -> Result<(), SpeculationError> {
        match self.state(node) {
            Resolution::Unresolved | Resolution::Canonicalizing => {
                self.stats.canonicalize_visits += 1;
                self.set(node, Resolution::Canonicalizing);
                Ok(())
            }
            from => Err(rejected(node, from, Resolution::Canonicalizing)),
        }
    }

    /// The visit of `node` ended without a fold.
    pub fn unresolved(&mut self, node: NodeId) -> Result<(), SpeculationError> {
        match self.state(node) {
            Resolution::Canonicalizing => {
                self.set(node, Resolution::Unresolved);
                Ok(())
            }
            from => Err(rejected(node, from, Resolution::Unresolved)),
        }
    }

    /// Lowering of `node` starts.
    pub fn begin_lowering(&mut self, node: NodeId) -> Result<(), SpeculationError> {
        match self.state(node) {
            Resolution::Unresolved | Resolution::Canonicalizing => {
                self.set(node, Resolution::Lowering);
                Ok(())
            }
            from => Err(rejected(node, from, Resolution::Lowering)),
        }
    }

    /// `node` has been removed from the graph in favor of `replacement`.
    pub fn replaced(
        &mut self,
        node: NodeId,
        replacement: Replacement,
    ) -> Result<(), SpeculationError> {
        let to = match replacement {
            Replacement::Constant => Resolution::ReplacedConstant,
            Replacement::Dispatch => Resolution::ReplacedDispatch,
        };
        match (self.state(node), replacement) {
            (Resolution::Canonicalizing, Replacement::Constant) => {
                self.stats.folded_in_canonicalize += 1;
            }
            (Resolution::Lowering, Replacement::Constant) => self.stats.folded_in_lowering += 1,
            (Resolution::Lowering, Replacement::Dispatch) => self.stats.lowered_to_dispatch += 1,
            (from, _) => return Err(rejected(node, from, to)),
        }
        self.set(node, to);
        Ok(())
    }

    fn set(&mut self, node: NodeId, state: Resolution) {
        tracing::trace!(?node, ?state, "resolution");
        self.states.insert(node, state);
    }
}

fn rejected(node: NodeId, from: Resolution, to: Resolution) -> SpeculationError {
    if from.is_terminal() {
        SpeculationError::AlreadyReplaced { node }
    } else {
        SpeculationError::InvalidTransition { node, from, to }
    }
}

#[cfg(test)]
mod tests;
