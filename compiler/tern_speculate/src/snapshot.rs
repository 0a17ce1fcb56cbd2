//! Per-compilation snapshot of call-site bindings.
//!
//! A call site can be re-bound by the mutator while a unit is compiling.
//! Every fold of the same call site within one compilation must see the
//! same target, so each binding is read from the runtime once and replayed
//! for the rest of the compilation.

use rustc_hash::FxHashMap;
use tern_ir::{CallSiteBinding, ConstantReflection, ObjectRef, ReflectionError};

/// Call-site bindings observed so far in this compilation.
#[derive(Clone, Debug, Default)]
pub struct BindingSnapshot {
    bindings: FxHashMap<ObjectRef, CallSiteBinding>,
}

impl BindingSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The binding of `call_site`, read from `reflection` on first use.
    ///
    /// Reflection failures are not cached; they abort the compilation.
    pub fn binding(
        &mut self,
        reflection: &dyn ConstantReflection,
        call_site: ObjectRef,
    ) -> Result<CallSiteBinding, ReflectionError> {
        if let Some(&binding) = self.bindings.get(&call_site) {
            return Ok(binding);
        }
        let binding = reflection.call_site_binding(call_site)?;
        tracing::trace!(?call_site, target = ?binding.target, "call-site binding observed");
        self.bindings.insert(call_site, binding);
        Ok(binding)
    }

    /// The recorded binding of `call_site`, without reading the runtime.
    pub fn get(&self, call_site: ObjectRef) -> Option<CallSiteBinding> {
        self.bindings.get(&call_site).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
