use pretty_assertions::assert_eq;

use super::*;

const N: NodeId = NodeId::new(3);

#[test]
fn fold_during_canonicalization() {
    let mut log = ResolutionLog::new();
    assert_eq!(log.state(N), Resolution::Unresolved);

    log.begin_canonicalize(N).unwrap();
    log.unresolved(N).unwrap();
    log.begin_canonicalize(N).unwrap();
    log.replaced(N, Replacement::Constant).unwrap();

    assert_eq!(log.state(N), Resolution::ReplacedConstant);
    assert_eq!(log.stats().canonicalize_visits, 2);
    assert_eq!(log.stats().folded_in_canonicalize, 1);
}

#[test]
fn lowering_outcomes() {
    let mut log = ResolutionLog::new();
    let other = NodeId::new(4);

    log.begin_lowering(N).unwrap();
    log.replaced(N, Replacement::Dispatch).unwrap();
    log.begin_canonicalize(other).unwrap();
    log.unresolved(other).unwrap();
    log.begin_lowering(other).unwrap();
    log.replaced(other, Replacement::Constant).unwrap();

    assert_eq!(log.state(N), Resolution::ReplacedDispatch);
    assert_eq!(log.state(other), Resolution::ReplacedConstant);
    let stats = log.stats();
    assert_eq!(stats.lowered_to_dispatch, 1);
    assert_eq!(stats.folded_in_lowering, 1);
    assert_eq!(stats.folds(), 1);
}

#[test]
fn terminal_states_reject_every_hook() {
    let mut log = ResolutionLog::new();
    log.begin_lowering(N).unwrap();
    log.replaced(N, Replacement::Dispatch).unwrap();

    let already = SpeculationError::AlreadyReplaced { node: N };
    assert_eq!(log.begin_canonicalize(N), Err(already.clone()));
    assert_eq!(log.begin_lowering(N), Err(already.clone()));
    assert_eq!(log.replaced(N, Replacement::Constant), Err(already));
}

#[test]
fn replacement_needs_a_running_hook() {
    let mut log = ResolutionLog::new();
    assert_eq!(
        log.replaced(N, Replacement::Constant),
        Err(SpeculationError::InvalidTransition {
            node: N,
            from: Resolution::Unresolved,
            to: Resolution::ReplacedConstant,
        })
    );
    // The canonicalizer never produces a dispatch.
    log.begin_canonicalize(N).unwrap();
    assert!(matches!(
        log.replaced(N, Replacement::Dispatch),
        Err(SpeculationError::InvalidTransition { .. })
    ));
}
