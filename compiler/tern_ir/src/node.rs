//! Node identities and node kinds.

use std::fmt;

use bitflags::bitflags;

use crate::constant::{Constant, TypeRef};

// ── ID newtype ──────────────────────────────────────────────────────

/// Node ID within a [`Graph`](crate::Graph).
///
/// IDs are allocated sequentially and never reused: once a node has been
/// replaced, its ID stays dead for the rest of the graph's lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a node ID from a raw index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

// ── Call descriptions ───────────────────────────────────────────────

/// Methods the JIT knows how to call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum MethodRef {
    /// `CallSite.getTarget()`: returns the call site's current target.
    /// Overridden per call-site flavor, so it dispatches virtually.
    CallSiteGetTarget,
}

impl MethodRef {
    /// Human-readable method name.
    pub fn name(self) -> &'static str {
        match self {
            MethodRef::CallSiteGetTarget => "CallSite.getTarget",
        }
    }
}

/// How the source program invokes a method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum InvokeKind {
    /// Receiver-dependent dispatch.
    Virtual,
    /// Statically bound instance call.
    Special,
    /// No receiver.
    Static,
}

impl InvokeKind {
    /// Returns `true` if the first argument is a receiver.
    #[inline]
    pub fn has_receiver(self) -> bool {
        !matches!(self, InvokeKind::Static)
    }
}

/// The call a macro or invoke node stands for.
///
/// A macro node keeps the descriptor of the call it replaced so it can
/// always fall back to that call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct CallDescriptor {
    pub method: MethodRef,
    pub invoke_kind: InvokeKind,
    /// Bytecode index of the call in the source method.
    pub bci: u32,
}

/// How a lowered call reaches its code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Dispatch {
    /// Look the implementation up through the receiver's class.
    Virtual,
    /// Call the implementation for `receiver_type` directly.
    Direct { receiver_type: TypeRef },
}

/// Target of a low-level [`NodeKind::Call`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct CallTarget {
    pub method: MethodRef,
    pub dispatch: Dispatch,
    pub bci: u32,
}

// ── Node kinds ──────────────────────────────────────────────────────

bitflags! {
    /// Static properties of a node kind.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Lives on the control chain.
        const FIXED = 1 << 0;
        /// Must be lowered before code generation.
        const HIGH_LEVEL = 1 << 1;
        /// Ends the control chain.
        const TERMINATOR = 1 << 2;
    }
}

/// The operation a node performs.
///
/// Inputs are stored on the node in the graph, not in the kind. Input
/// layout per kind:
///
/// | Kind | Inputs |
/// |------|--------|
/// | `Start`, `Parameter`, `Constant` | none |
/// | `Return` | `[value]` |
/// | `CallSiteTarget`, `Invoke`, `Call` | call arguments, receiver first |
/// | `NullCheck` | `[object]` |
/// | `Store` | `[value]` |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Entry of the control chain.
    Start,
    /// Exit of the control chain.
    Return,
    /// Incoming argument.
    Parameter { index: u32 },
    /// Compile-time constant.
    Constant(Constant),
    /// Speculative `CallSite.getTarget()` intrinsic. Folds to the call
    /// site's target when the call site is a constant, otherwise lowers to
    /// the call it stands for.
    CallSiteTarget(CallDescriptor),
    /// Generic, unoptimized dispatch of a method call.
    Invoke(CallDescriptor),
    /// Traps if its input is null.
    NullCheck,
    /// Low-level call ready for code generation.
    Call(CallTarget),
    /// Writes its input to an observable slot.
    Store { slot: u32 },
}

impl NodeKind {
    /// Static properties of this kind.
    pub fn flags(&self) -> NodeFlags {
        match self {
            NodeKind::Start | NodeKind::NullCheck | NodeKind::Call(_) | NodeKind::Store { .. } => {
                NodeFlags::FIXED
            }
            NodeKind::Return => NodeFlags::FIXED | NodeFlags::TERMINATOR,
            NodeKind::Parameter { .. } | NodeKind::Constant(_) => NodeFlags::empty(),
            NodeKind::CallSiteTarget(_) | NodeKind::Invoke(_) => {
                NodeFlags::FIXED | NodeFlags::HIGH_LEVEL
            }
        }
    }

    /// Returns `true` if this kind lives on the control chain.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.flags().contains(NodeFlags::FIXED)
    }

    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Start => "Start",
            NodeKind::Return => "Return",
            NodeKind::Parameter { .. } => "Parameter",
            NodeKind::Constant(_) => "Constant",
            NodeKind::CallSiteTarget(_) => "CallSiteTarget",
            NodeKind::Invoke(_) => "Invoke",
            NodeKind::NullCheck => "NullCheck",
            NodeKind::Call(_) => "Call",
            NodeKind::Store { .. } => "Store",
        }
    }
}
