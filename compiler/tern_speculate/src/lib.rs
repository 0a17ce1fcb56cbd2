//! Speculative call-site target resolution for the Tern JIT.
//!
//! A `CallSiteTarget` node reads the current target of a dynamically bound
//! call site. This crate resolves such reads at compile time when the call
//! site is a known constant, and otherwise lowers them to a real call:
//!
//! - **Folding** ([`try_fold`]): pure resolution of a constant call site's
//!   target. Returns the constant plus the [`Assumption`](tern_ir::Assumption)
//!   the fold depends on; [`FoldedTarget::commit`] applies both.
//!
//! - **Canonicalization** ([`canonicalize`]): optimistic worklist pass.
//!   A node that folds is replaced by its constant (floating replacement).
//!
//! - **Lowering** ([`lower`]): mandatory, once per node. Folds if it can,
//!   otherwise replaces the node by an invoke in the same control slot
//!   (fixed replacement) and lowers that to a `Call`.
//!
//! - **Pipeline** ([`compile_unit`], [`compile_units`]): runs the phases
//!   for one unit or many in parallel and hands back the graph, its
//!   assumptions and counters.
//!
//! Call-site bindings are read once per compilation ([`BindingSnapshot`]),
//! so every fold of one call site within a unit agrees.

use std::sync::Once;

pub mod call_site_target;
pub mod canonicalize;
mod config;
mod context;
mod error;
mod fold;
pub mod lowering;
pub mod macros;
pub mod null_check;
mod pipeline;
mod snapshot;
mod state;

#[cfg(test)]
mod test_helpers;

pub use call_site_target::CallSiteTargetNode;
pub use canonicalize::{canonicalize, Canonical, Canonicalizable};
pub use config::{SpeculationConfig, NO_CALL_SITE_FOLD_VAR, VERIFY_GRAPH_VAR};
pub use context::{CompileContext, Providers};
pub use error::SpeculationError;
pub use fold::{try_fold, FoldedTarget};
pub use lowering::{lower, InvokeNode, Lowerable, Lowered};
pub use null_check::NullCheckNode;
#[cfg(feature = "cache")]
pub use pipeline::decode_assumptions;
pub use pipeline::{compile_unit, compile_units, CompiledUnit};
pub use snapshot::BindingSnapshot;
pub use state::{Replacement, Resolution, ResolutionLog, SpeculationStats};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset or unparsable, or when another
/// global subscriber is already installed. Later calls are no-ops.
///
/// - `RUST_LOG=tern_speculate=debug`: folds, replacements, phase summaries
/// - `RUST_LOG=tern_speculate=trace`: every node visit and state change
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let Ok(filter) = EnvFilter::try_from_default_env() else {
            return;
        };
        let installed = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(filter)
            .try_init();
        if installed.is_err() {
            tracing::debug!("tracing subscriber already installed");
        }
    });
}
