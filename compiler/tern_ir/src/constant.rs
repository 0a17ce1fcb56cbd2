//! Compile-time constants and runtime object handles.

use std::fmt;

/// Handle to an object in the runtime heap.
///
/// The optimizer never looks inside an object directly; it goes through
/// [`ConstantReflection`](crate::ConstantReflection) and
/// [`MetaAccess`](crate::MetaAccess).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct ObjectRef(u32);

impl ObjectRef {
    /// Create an object handle from a raw heap index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into the heap).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Handle to a runtime class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TypeRef(u32);

impl TypeRef {
    /// Create a class handle from a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A compile-time-known value.
///
/// Constancy is one-way: a node holding a `Constant` may always be treated
/// as an unknown value, never the reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Constant {
    /// The null reference.
    Null,
    /// A primitive integer.
    Int(i64),
    /// A non-null reference to a heap object.
    Object(ObjectRef),
}

impl Constant {
    /// Returns `true` for the null reference constant.
    #[inline]
    pub fn is_null(self) -> bool {
        matches!(self, Constant::Null)
    }

    /// The referenced object, if this is a non-null object constant.
    #[inline]
    pub fn as_object(self) -> Option<ObjectRef> {
        match self {
            Constant::Object(obj) => Some(obj),
            Constant::Null | Constant::Int(_) => None,
        }
    }

    /// Build a reference constant from an optional object.
    ///
    /// `None` maps to [`Constant::Null`].
    #[inline]
    pub fn from_object(obj: Option<ObjectRef>) -> Self {
        obj.map_or(Constant::Null, Constant::Object)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => f.write_str("null"),
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Object(obj) => write!(f, "{obj:?}"),
        }
    }
}
