use pretty_assertions::assert_eq;
use tern_ir::{
    constant_stamp, Assumptions, CallDescriptor, CallTarget, Constant, Dispatch, GraphBuilder,
    InvokeKind, MethodRef, Stamp,
};
use tern_runtime::classes;

use crate::config::SpeculationConfig;
use crate::state::Resolution;
use crate::test_helpers::Fixture;

use super::*;

fn descriptor(invoke_kind: InvokeKind) -> CallDescriptor {
    CallDescriptor {
        method: MethodRef::CallSiteGetTarget,
        invoke_kind,
        bci: 9,
    }
}

#[test]
fn phase_lowers_every_high_level_node() {
    let fx = Fixture::bound();
    let config = SpeculationConfig::default();
    let mut cx = fx.context(&config);

    let mut b = GraphBuilder::new();
    let receiver = fx.call_site_constant();
    let k = b.constant(receiver, constant_stamp(&fx.rt, receiver));
    let p = b.parameter(0, Stamp::declared(classes::CALL_SITE));
    let folded = b.call_site_target(k, 0).unwrap();
    let dynamic = b.call_site_target(p, 1).unwrap();
    let invoke = b
        .emit_fixed(NodeKind::Invoke(descriptor(InvokeKind::Virtual)), Stamp::object(), &[k])
        .unwrap();
    b.store(0, folded).unwrap();
    b.store(1, dynamic).unwrap();
    b.ret(invoke).unwrap();
    let mut graph = b.finish();

    assert_eq!(lower(&mut graph, &mut cx), Ok(3));

    assert_eq!(cx.log.state(folded), Resolution::ReplacedConstant);
    assert_eq!(cx.log.state(dynamic), Resolution::ReplacedDispatch);
    assert_eq!(graph.count_live(|k| k.flags().contains(NodeFlags::HIGH_LEVEL)), 0);
    assert_eq!(graph.count_live(|k| matches!(k, NodeKind::Call(_))), 2);
    assert_eq!(graph.assumptions().map(Assumptions::len), Some(1));
    graph.verify().unwrap();
}

#[test]
fn static_invoke_has_no_receiver_check() {
    let fx = Fixture::bound();
    let config = SpeculationConfig::default();
    let mut cx = fx.context(&config);

    let mut b = GraphBuilder::new();
    let p = b.parameter(0, Stamp::object());
    let invoke = b
        .emit_fixed(NodeKind::Invoke(descriptor(InvokeKind::Static)), Stamp::object(), &[p])
        .unwrap();
    b.ret(invoke).unwrap();
    let mut graph = b.finish();

    let view = InvokeNode::of(&graph, invoke).unwrap();
    assert_eq!(view.receiver(&graph), None);
    let Lowered::Dispatch(call) = view.lower(&mut graph, &mut cx).unwrap() else {
        panic!("invokes always lower to calls");
    };

    assert_eq!(
        *graph.kind(call),
        NodeKind::Call(CallTarget {
            method: MethodRef::CallSiteGetTarget,
            dispatch: Dispatch::Virtual,
            bci: 9,
        })
    );
    assert_eq!(graph.fixed_chain(), vec![graph.start(), call, graph.next(call).unwrap()]);
    assert_eq!(cx.log.stats().null_checks_inserted, 0);
}

#[test]
fn exact_receiver_is_devirtualized() {
    let fx = Fixture::bound();
    let config = SpeculationConfig::default();
    let mut cx = fx.context(&config);

    let mut b = GraphBuilder::new();
    let receiver = fx.call_site_constant();
    let k = b.constant(receiver, constant_stamp(&fx.rt, receiver));
    let invoke = b
        .emit_fixed(NodeKind::Invoke(descriptor(InvokeKind::Virtual)), Stamp::object(), &[k])
        .unwrap();
    b.ret(invoke).unwrap();
    let mut graph = b.finish();

    let lowered = lower_node(&mut graph, invoke, &mut cx).unwrap();

    assert!(matches!(
        graph.kind(lowered.node()),
        NodeKind::Call(CallTarget {
            dispatch: Dispatch::Direct {
                receiver_type: classes::MUTABLE_CALL_SITE
            },
            ..
        })
    ));
    assert_eq!(cx.log.stats().devirtualized, 1);
}

#[test]
fn unlowered_nodes_are_reported() {
    let fx = Fixture::bound();
    let mut b = GraphBuilder::new();
    let p = b.parameter(0, Stamp::object());
    let target = b.call_site_target(p, 0).unwrap();
    b.ret(target).unwrap();
    let graph = b.finish();

    assert_eq!(
        check_lowered(&graph),
        Err(SpeculationError::Unlowered {
            node: target,
            kind: "CallSiteTarget",
        })
    );
    // Nothing to lower once the node is gone.
    let config = SpeculationConfig::default();
    let mut cx = fx.context(&config);
    let mut graph = graph;
    lower(&mut graph, &mut cx).unwrap();
    check_lowered(&graph).unwrap();
}

#[test]
fn only_high_level_nodes_lower() {
    let fx = Fixture::bound();
    let config = SpeculationConfig::default();
    let mut cx = fx.context(&config);
    let mut b = GraphBuilder::new();
    let k = b.constant(Constant::Int(1), Stamp::Int);
    let store = b.store(0, k).unwrap();
    b.ret(k).unwrap();
    let mut graph = b.finish();

    assert_eq!(
        lower_node(&mut graph, store, &mut cx),
        Err(SpeculationError::UnexpectedNode {
            node: store,
            expected: "high-level node",
            found: "Store",
        })
    );
}
