//! Property-based tests for call-site target speculation.
//!
//! Generates small straight-line units that read a call site one or more
//! times and checks, for every combination of call-site flavor, binding,
//! receiver shape and registry availability:
//! 1. Equivalence: the compiled unit behaves like the unoptimized one,
//!    with and without folding
//! 2. Completeness: no high-level node survives compilation
//! 3. Bookkeeping: a fold records exactly one fact per call site, a
//!    non-fold records none
//! 4. Idempotence: canonicalizing an already canonical graph changes nothing

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use proptest::prelude::*;
use tern_ir::{
    constant_stamp, CallSiteKind, Constant, Graph, GraphBuilder, NodeFlags, ObjectRef, Stamp,
};
use tern_runtime::{classes, evaluate, Outcome, Runtime, Trap};
use tern_speculate::{
    canonicalize, compile_unit, CompileContext, Providers, SpeculationConfig,
};

// -- Strategies --

#[derive(Clone, Copy, Debug)]
enum ReceiverShape {
    Parameter,
    Constant,
    Null,
}

#[derive(Clone, Copy, Debug)]
struct Case {
    kind: CallSiteKind,
    bound: bool,
    receiver: ReceiverShape,
    with_assumptions: bool,
    reads: u32,
}

fn kind_strategy() -> impl Strategy<Value = CallSiteKind> {
    prop_oneof![
        Just(CallSiteKind::Mutable),
        Just(CallSiteKind::Volatile),
        Just(CallSiteKind::Constant),
    ]
}

fn receiver_strategy() -> impl Strategy<Value = ReceiverShape> {
    prop_oneof![
        Just(ReceiverShape::Parameter),
        Just(ReceiverShape::Constant),
        Just(ReceiverShape::Null),
    ]
}

fn case_strategy() -> impl Strategy<Value = Case> {
    (
        kind_strategy(),
        any::<bool>(),
        receiver_strategy(),
        any::<bool>(),
        1..4u32,
    )
        .prop_map(|(kind, bound, receiver, with_assumptions, reads)| Case {
            kind,
            bound,
            receiver,
            with_assumptions,
            reads,
        })
}

// -- Fixtures --

struct Unit {
    rt: Runtime,
    call_site: ObjectRef,
    graph: Graph,
    args: Vec<Constant>,
}

/// `reads` call-site reads, each stored to its own slot; returns the last.
fn build(case: Case) -> Unit {
    let rt = Runtime::new();
    let m1 = rt.alloc_method_handle("m1");
    let call_site = rt
        .alloc_call_site(case.kind, case.bound.then_some(m1))
        .unwrap();

    let mut b = if case.with_assumptions {
        GraphBuilder::new()
    } else {
        GraphBuilder::without_assumptions()
    };
    let mut args = Vec::new();
    let operand = match case.receiver {
        ReceiverShape::Parameter => {
            args.push(Constant::Object(call_site));
            b.parameter(0, Stamp::declared(classes::CALL_SITE))
        }
        ReceiverShape::Constant => {
            let c = Constant::Object(call_site);
            b.constant(c, constant_stamp(&rt, c))
        }
        ReceiverShape::Null => b.constant(Constant::Null, Stamp::null()),
    };
    let mut last = operand;
    for slot in 0..case.reads {
        last = b.call_site_target(operand, slot).unwrap();
        b.store(slot, last).unwrap();
    }
    b.ret(last).unwrap();

    Unit {
        rt,
        call_site,
        graph: b.finish(),
        args,
    }
}

fn observe(result: Result<Outcome, Trap>) -> Result<Outcome, &'static str> {
    result.map_err(|trap| match trap {
        Trap::NullPointer { .. } => "null pointer",
        _ => "unexpected trap",
    })
}

fn folds(case: Case) -> bool {
    matches!(case.receiver, ReceiverShape::Constant)
        && case.bound
        && (case.with_assumptions || case.kind == CallSiteKind::Constant)
}

// -- Properties --

proptest! {
    #[test]
    fn compiled_units_behave_like_the_source(case in case_strategy()) {
        let unit = build(case);
        let expected = observe(evaluate(&unit.graph, &unit.rt, &unit.args));
        prop_assert_ne!(expected.clone().err(), Some("unexpected trap"));

        for config in [SpeculationConfig::default(), SpeculationConfig::conservative()] {
            let compiled =
                compile_unit(unit.graph.clone(), Providers::new(&unit.rt), &config).unwrap();
            prop_assert_eq!(
                observe(evaluate(&compiled.graph, &unit.rt, &unit.args)),
                expected.clone()
            );
        }
    }

    #[test]
    fn nothing_high_level_survives(case in case_strategy()) {
        let unit = build(case);
        let compiled = compile_unit(
            unit.graph,
            Providers::new(&unit.rt),
            &SpeculationConfig::default(),
        )
        .unwrap();

        prop_assert_eq!(
            compiled.graph.count_live(|k| k.flags().contains(NodeFlags::HIGH_LEVEL)),
            0
        );
        let expected_folds = if folds(case) { case.reads } else { 0 };
        prop_assert_eq!(compiled.stats.folds(), expected_folds);
        prop_assert_eq!(compiled.stats.lowered_to_dispatch, case.reads - expected_folds);
    }

    #[test]
    fn one_fact_per_folded_call_site(case in case_strategy()) {
        let unit = build(case);
        let compiled = compile_unit(
            unit.graph,
            Providers::new(&unit.rt),
            &SpeculationConfig::default(),
        )
        .unwrap();

        let expected = usize::from(folds(case) && case.with_assumptions);
        prop_assert_eq!(compiled.assumptions.len(), expected);
        prop_assert_eq!(
            compiled.assumptions.for_call_site(unit.call_site).count(),
            expected
        );
        prop_assert!(compiled.validate(&unit.rt).is_ok());
    }

    #[test]
    fn canonicalization_is_idempotent(case in case_strategy()) {
        let mut unit = build(case);
        let config = SpeculationConfig::default();
        let mut cx = CompileContext::new(Providers::new(&unit.rt), &config);

        canonicalize(&mut unit.graph, &mut cx).unwrap();
        let nodes = unit.graph.node_count();
        let assumptions = unit.graph.assumptions().cloned();

        prop_assert_eq!(canonicalize(&mut unit.graph, &mut cx).unwrap(), 0);
        prop_assert_eq!(unit.graph.node_count(), nodes);
        prop_assert_eq!(unit.graph.assumptions().cloned(), assumptions);
    }
}
