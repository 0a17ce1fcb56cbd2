//! Shared test utilities for the folding, canonicalization and lowering
//! tests. Only compiled in test builds.

use tern_ir::{
    constant_stamp, CallSiteKind, Constant, Graph, GraphBuilder, NodeId, ObjectRef, Stamp,
};
use tern_runtime::{classes, Runtime};

use crate::config::SpeculationConfig;
use crate::context::{CompileContext, Providers};

/// A runtime holding one call site of `kind`, bound to a method handle
/// named `m1` when `bound`.
pub(crate) struct Fixture {
    pub rt: Runtime,
    pub call_site: ObjectRef,
    pub m1: ObjectRef,
}

impl Fixture {
    pub fn new(kind: CallSiteKind, bound: bool) -> Self {
        let rt = Runtime::new();
        let m1 = rt.alloc_method_handle("m1");
        let call_site = rt
            .alloc_call_site(kind, bound.then_some(m1))
            .unwrap();
        Fixture { rt, call_site, m1 }
    }

    /// Mutable call site bound to `m1`.
    pub fn bound() -> Self {
        Self::new(CallSiteKind::Mutable, true)
    }

    pub fn providers(&self) -> Providers<'_> {
        Providers::new(&self.rt)
    }

    pub fn context<'a>(&'a self, config: &'a SpeculationConfig) -> CompileContext<'a> {
        CompileContext::new(self.providers(), config)
    }

    pub fn call_site_constant(&self) -> Constant {
        Constant::Object(self.call_site)
    }
}

/// How the call-site operand of a test graph is produced.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Receiver {
    /// Parameter 0, a call site unknown at compile time.
    Parameter,
    /// A constant with the stamp the runtime reports for it.
    Constant(Constant),
}

/// `Start → CallSiteTarget(receiver) → Store(0, target) → Return(target)`.
///
/// Returns the graph and the `CallSiteTarget` node.
pub(crate) fn call_site_target_graph(
    rt: &Runtime,
    receiver: Receiver,
    with_assumptions: bool,
) -> (Graph, NodeId) {
    let mut b = if with_assumptions {
        GraphBuilder::new()
    } else {
        GraphBuilder::without_assumptions()
    };
    let operand = match receiver {
        Receiver::Parameter => b.parameter(0, Stamp::declared(classes::CALL_SITE)),
        Receiver::Constant(c) => b.constant(c, constant_stamp(rt, c)),
    };
    let target = b.call_site_target(operand, 0).unwrap();
    b.store(0, target).unwrap();
    b.ret(target).unwrap();
    (b.finish(), target)
}
