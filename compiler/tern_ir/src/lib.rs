//! Sea-of-nodes graph IR for the Tern JIT.
//!
//! This crate provides:
//!
//! - **Graph** ([`Graph`], [`NodeId`], [`NodeKind`]): an arena of nodes
//!   addressed by stable indices. Fixed nodes sit on a single control chain
//!   starting at [`NodeKind::Start`]; floating nodes are pure values that
//!   hang off data edges only. Replacing a node marks its id dead forever.
//!
//! - **Values** ([`Constant`], [`Stamp`]): compile-time constants and the
//!   type/nullness facts the optimizer tracks for every node.
//!
//! - **Assumptions** ([`Assumptions`], [`Assumption`]): speculative facts a
//!   compiled unit depends on. Owned by the graph, one registry per unit.
//!
//! - **Capabilities** ([`MetaAccess`], [`ConstantReflection`]): the narrow
//!   views of the runtime object model the optimizer is allowed to use.
//!
//! # Crate Dependencies
//!
//! `tern_ir` has no dependency on the runtime or on any optimization pass.
//! Passes live in `tern_speculate`; the reference runtime lives in
//! `tern_runtime`.

pub mod assumptions;
pub mod constant;
pub mod graph;
pub mod meta;
pub mod node;
pub mod stamp;

pub use assumptions::{Assumption, Assumptions};
pub use constant::{Constant, ObjectRef, TypeRef};
pub use graph::{Graph, GraphBuilder, GraphError};
pub use meta::{
    constant_stamp, CallSiteBinding, CallSiteKind, ConstantReflection, MetaAccess,
    ReflectionError,
};
pub use node::{
    CallDescriptor, CallTarget, Dispatch, InvokeKind, MethodRef, NodeFlags, NodeId, NodeKind,
};
pub use stamp::Stamp;
