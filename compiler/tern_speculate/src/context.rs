//! State shared by the hooks of one compilation.

use tern_ir::{ConstantReflection, MetaAccess};

use crate::config::SpeculationConfig;
use crate::snapshot::BindingSnapshot;
use crate::state::ResolutionLog;

/// The runtime capabilities a compilation may use.
///
/// Both are usually the same runtime object; they are kept apart so tests
/// can substitute either one.
#[derive(Clone, Copy)]
pub struct Providers<'a> {
    pub meta: &'a (dyn MetaAccess + Sync),
    pub reflection: &'a (dyn ConstantReflection + Sync),
}

impl<'a> Providers<'a> {
    /// Use `runtime` for both capabilities.
    pub fn new<R>(runtime: &'a R) -> Self
    where
        R: MetaAccess + ConstantReflection + Sync,
    {
        Providers {
            meta: runtime,
            reflection: runtime,
        }
    }
}

/// Everything the canonicalization and lowering hooks of one unit share.
///
/// Owned by a single compilation and never shared between threads.
pub struct CompileContext<'a> {
    pub providers: Providers<'a>,
    pub config: &'a SpeculationConfig,
    pub snapshot: BindingSnapshot,
    pub log: ResolutionLog,
}

impl<'a> CompileContext<'a> {
    pub fn new(providers: Providers<'a>, config: &'a SpeculationConfig) -> Self {
        CompileContext {
            providers,
            config,
            snapshot: BindingSnapshot::new(),
            log: ResolutionLog::new(),
        }
    }
}
