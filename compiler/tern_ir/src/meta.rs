//! Capabilities the optimizer uses to look at the runtime.
//!
//! The optimizer never reads the heap directly. [`MetaAccess`] answers type
//! questions about constants; [`ConstantReflection`] dereferences call-site
//! constants. Both are implemented by the runtime (`tern_runtime::Runtime`)
//! and must be deterministic for the duration of a compilation.

use crate::constant::{Constant, ObjectRef, TypeRef};
use crate::stamp::Stamp;

/// Flavor of a call-site object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CallSiteKind {
    /// Re-bindable; ordinary memory semantics.
    Mutable,
    /// Re-bindable; the target is read with volatile semantics.
    Volatile,
    /// Bound once at link time and never re-bound.
    Constant,
}

impl CallSiteKind {
    /// Returns `true` if the target may change after linking.
    #[inline]
    pub fn is_rebindable(self) -> bool {
        !matches!(self, CallSiteKind::Constant)
    }
}

/// A call site's binding as observed at one point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallSiteBinding {
    pub kind: CallSiteKind,
    /// Current target, `None` if the call site is not linked yet.
    pub target: Option<ObjectRef>,
}

/// A constant that should be a call site could not be read as one.
///
/// Seeing this during compilation means an upstream stage built a malformed
/// graph.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReflectionError {
    #[error("{0:?} is not a call-site object")]
    NotACallSite(ObjectRef),
    #[error("{0:?} does not refer to a live heap object")]
    Dangling(ObjectRef),
}

/// Type information about heap objects.
pub trait MetaAccess {
    /// Exact runtime class of `object`, or `None` if the handle is dangling.
    fn type_of(&self, object: ObjectRef) -> Option<TypeRef>;
}

/// Dereferencing of call-site constants.
pub trait ConstantReflection {
    /// Read the current binding of the call site `object`.
    fn call_site_binding(&self, object: ObjectRef) -> Result<CallSiteBinding, ReflectionError>;
}

/// The strongly-typed stamp for a constant.
pub fn constant_stamp(meta: &dyn MetaAccess, constant: Constant) -> Stamp {
    match constant {
        Constant::Null => Stamp::null(),
        Constant::Int(_) => Stamp::Int,
        Constant::Object(obj) => match meta.type_of(obj) {
            Some(ty) => Stamp::exact_non_null(ty),
            None => Stamp::object().as_non_null(),
        },
    }
}
