//! Speculative facts a compiled unit depends on.
//!
//! Every speculative fold contributes an [`Assumption`] to the registry of
//! the graph it was performed in. The registry travels with the compiled
//! unit; the runtime checks it before installing the code and whenever a
//! call site is re-bound. Records are append-only and never mutated.

use rustc_hash::FxHashSet;

use crate::constant::ObjectRef;
use crate::meta::ConstantReflection;

/// A single invalidation-relevant fact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Assumption {
    /// The target of `call_site` is `target`.
    CallSiteTargetValue {
        call_site: ObjectRef,
        target: ObjectRef,
    },
}

impl Assumption {
    /// The call site this fact is about.
    #[inline]
    pub fn call_site(&self) -> ObjectRef {
        match self {
            Assumption::CallSiteTargetValue { call_site, .. } => *call_site,
        }
    }

    /// Returns `true` if the fact still holds in the live runtime.
    ///
    /// A call site that can no longer be read as one invalidates the fact.
    pub fn is_valid(&self, reflection: &dyn ConstantReflection) -> bool {
        match self {
            Assumption::CallSiteTargetValue { call_site, target } => reflection
                .call_site_binding(*call_site)
                .is_ok_and(|binding| binding.target == Some(*target)),
        }
    }
}

/// Insertion-ordered, de-duplicated assumption registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assumptions {
    records: Vec<Assumption>,
    seen: FxHashSet<Assumption>,
}

impl Assumptions {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fact. Returns `false` if an equal fact was already recorded.
    pub fn record(&mut self, assumption: Assumption) -> bool {
        if !self.seen.insert(assumption) {
            return false;
        }
        self.records.push(assumption);
        true
    }

    /// Recorded facts as a slice, in insertion order.
    pub fn as_slice(&self) -> &[Assumption] {
        &self.records
    }

    /// Number of distinct facts.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Facts that mention `call_site`.
    pub fn for_call_site(&self, call_site: ObjectRef) -> impl Iterator<Item = &Assumption> {
        self.records
            .iter()
            .filter(move |a| a.call_site() == call_site)
    }

    /// The first fact that no longer holds, if any.
    pub fn first_invalid(&self, reflection: &dyn ConstantReflection) -> Option<&Assumption> {
        self.records.iter().find(|a| !a.is_valid(reflection))
    }
}

impl FromIterator<Assumption> for Assumptions {
    fn from_iter<I: IntoIterator<Item = Assumption>>(iter: I) -> Self {
        let mut assumptions = Assumptions::new();
        for assumption in iter {
            assumptions.record(assumption);
        }
        assumptions
    }
}
