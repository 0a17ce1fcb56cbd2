//! Reference runtime for the Tern JIT.
//!
//! Two pieces:
//!
//! - [`Runtime`]: a heap of call-site, method-handle and plain objects.
//!   It implements the optimizer's [`MetaAccess`](tern_ir::MetaAccess) and
//!   [`ConstantReflection`](tern_ir::ConstantReflection) capabilities and
//!   the mutator-side operations (linking and re-binding call sites).
//!   The heap sits behind a lock so compile threads and the mutator can
//!   share one runtime.
//!
//! - [`evaluate`]: an interpreter for graphs at any stage of
//!   optimization. Running the same program before and after a pass is how
//!   tests check that the pass preserved behavior.

pub mod eval;
mod heap;

pub use eval::{evaluate, Outcome, Trap};
pub use heap::{classes, Runtime, RuntimeError};
