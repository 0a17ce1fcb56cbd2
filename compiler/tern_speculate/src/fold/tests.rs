use pretty_assertions::assert_eq;
use tern_ir::{Assumptions, CallSiteKind, ReflectionError};
use tern_runtime::classes;

use crate::test_helpers::{call_site_target_graph, Fixture, Receiver};

use super::*;

fn operand(graph: &Graph, node: NodeId) -> Option<NodeId> {
    graph.inputs(node).first().copied()
}

#[test]
fn absent_operand_does_not_fold() {
    let fx = Fixture::bound();
    let (graph, _) = call_site_target_graph(&fx.rt, Receiver::Parameter, true);
    let mut snapshot = BindingSnapshot::new();
    assert_eq!(try_fold(&graph, None, fx.providers(), &mut snapshot), Ok(None));
}

#[test]
fn variable_operand_does_not_fold() {
    let fx = Fixture::bound();
    let (graph, node) = call_site_target_graph(&fx.rt, Receiver::Parameter, true);
    let mut snapshot = BindingSnapshot::new();
    assert_eq!(
        try_fold(&graph, operand(&graph, node), fx.providers(), &mut snapshot),
        Ok(None)
    );
    assert!(snapshot.is_empty());
}

#[test]
fn null_operand_is_never_dereferenced() {
    let fx = Fixture::bound();
    let (graph, node) =
        call_site_target_graph(&fx.rt, Receiver::Constant(Constant::Null), true);
    let mut snapshot = BindingSnapshot::new();
    assert_eq!(
        try_fold(&graph, operand(&graph, node), fx.providers(), &mut snapshot),
        Ok(None)
    );
    assert!(snapshot.is_empty());
}

#[test]
fn bound_call_site_folds_without_touching_the_graph() {
    let fx = Fixture::bound();
    let (graph, node) =
        call_site_target_graph(&fx.rt, Receiver::Constant(fx.call_site_constant()), true);
    let nodes_before = graph.node_count();
    let mut snapshot = BindingSnapshot::new();

    let folded = try_fold(&graph, operand(&graph, node), fx.providers(), &mut snapshot)
        .unwrap()
        .unwrap();

    assert_eq!(
        folded,
        FoldedTarget {
            constant: Constant::Object(fx.m1),
            stamp: Stamp::exact_non_null(classes::METHOD_HANDLE),
            assumption: Some(Assumption::CallSiteTargetValue {
                call_site: fx.call_site,
                target: fx.m1,
            }),
        }
    );
    assert_eq!(graph.node_count(), nodes_before);
    assert!(graph.assumptions().is_some_and(Assumptions::is_empty));
}

#[test]
fn unbound_call_site_does_not_fold() {
    let fx = Fixture::new(CallSiteKind::Volatile, false);
    let (graph, node) =
        call_site_target_graph(&fx.rt, Receiver::Constant(fx.call_site_constant()), true);
    let mut snapshot = BindingSnapshot::new();
    assert_eq!(
        try_fold(&graph, operand(&graph, node), fx.providers(), &mut snapshot),
        Ok(None)
    );
}

#[test]
fn without_registry_only_immutable_sites_fold() {
    let mutable = Fixture::bound();
    let (graph, node) = call_site_target_graph(
        &mutable.rt,
        Receiver::Constant(mutable.call_site_constant()),
        false,
    );
    let mut snapshot = BindingSnapshot::new();
    assert_eq!(
        try_fold(&graph, operand(&graph, node), mutable.providers(), &mut snapshot),
        Ok(None)
    );

    let constant = Fixture::new(CallSiteKind::Constant, true);
    let (graph, node) = call_site_target_graph(
        &constant.rt,
        Receiver::Constant(constant.call_site_constant()),
        false,
    );
    let mut snapshot = BindingSnapshot::new();
    let folded = try_fold(&graph, operand(&graph, node), constant.providers(), &mut snapshot)
        .unwrap()
        .unwrap();
    assert_eq!(folded.constant, Constant::Object(constant.m1));
    assert_eq!(folded.assumption, None);
}

#[test]
fn primitive_operand_is_type_confusion() {
    let fx = Fixture::bound();
    let (graph, node) =
        call_site_target_graph(&fx.rt, Receiver::Constant(Constant::Int(7)), true);
    let operand = operand(&graph, node);
    let mut snapshot = BindingSnapshot::new();
    assert_eq!(
        try_fold(&graph, operand, fx.providers(), &mut snapshot),
        Err(SpeculationError::TypeConfusion {
            node: operand.unwrap(),
            constant: Constant::Int(7),
            source: None,
        })
    );
}

#[test]
fn non_call_site_object_is_type_confusion() {
    let fx = Fixture::bound();
    let handle = Constant::Object(fx.m1);
    let (graph, node) = call_site_target_graph(&fx.rt, Receiver::Constant(handle), true);
    let operand = operand(&graph, node);
    let mut snapshot = BindingSnapshot::new();
    assert_eq!(
        try_fold(&graph, operand, fx.providers(), &mut snapshot),
        Err(SpeculationError::TypeConfusion {
            node: operand.unwrap(),
            constant: handle,
            source: Some(ReflectionError::NotACallSite(fx.m1)),
        })
    );
}

#[test]
fn folds_agree_across_rebinding_within_a_compilation() {
    let fx = Fixture::bound();
    let (graph, node) =
        call_site_target_graph(&fx.rt, Receiver::Constant(fx.call_site_constant()), true);
    let operand = operand(&graph, node);
    let mut snapshot = BindingSnapshot::new();

    let first = try_fold(&graph, operand, fx.providers(), &mut snapshot).unwrap();
    let m2 = fx.rt.alloc_method_handle("m2");
    fx.rt.set_target(fx.call_site, m2).unwrap();
    let second = try_fold(&graph, operand, fx.providers(), &mut snapshot).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        second.map(|f| f.constant),
        Some(Constant::Object(fx.m1))
    );
}

#[test]
fn commit_records_one_fact_and_interns_the_constant() {
    let fx = Fixture::bound();
    let (mut graph, node) =
        call_site_target_graph(&fx.rt, Receiver::Constant(fx.call_site_constant()), true);
    let operand = operand(&graph, node);
    let mut snapshot = BindingSnapshot::new();
    let folded = try_fold(&graph, operand, fx.providers(), &mut snapshot)
        .unwrap()
        .unwrap();

    let k1 = folded.commit(&mut graph);
    let k2 = folded.commit(&mut graph);

    assert_eq!(k1, k2);
    assert_eq!(*graph.kind(k1), NodeKind::Constant(Constant::Object(fx.m1)));
    let registry = graph.assumptions().unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.for_call_site(fx.call_site).count(), 1);
}
