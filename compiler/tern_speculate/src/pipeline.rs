//! The per-unit pipeline: canonicalize, lower, canonicalize, verify.
//!
//! Units are independent. [`compile_units`] compiles them in parallel,
//! each on one thread with its own graph, snapshot and log; a fatal defect
//! abandons only the unit it was found in.

use rayon::prelude::*;
use tern_ir::{Assumptions, ConstantReflection, Graph};

use crate::canonicalize::canonicalize;
use crate::config::SpeculationConfig;
use crate::context::{CompileContext, Providers};
use crate::error::SpeculationError;
use crate::lowering::lower;
use crate::state::SpeculationStats;

/// A unit ready for code generation.
#[derive(Clone, Debug)]
pub struct CompiledUnit {
    pub graph: Graph,
    /// Facts the unit is only valid under. Empty when the graph keeps no
    /// registry.
    pub assumptions: Assumptions,
    pub stats: SpeculationStats,
}

impl CompiledUnit {
    /// Check every assumption against the live runtime, as the runtime
    /// does before installing the code.
    pub fn validate(&self, reflection: &dyn ConstantReflection) -> Result<(), SpeculationError> {
        match self.assumptions.first_invalid(reflection) {
            Some(assumption) => Err(SpeculationError::InvalidatedAssumption(*assumption)),
            None => Ok(()),
        }
    }

    /// Serialize the assumptions for storage next to the compiled code.
    #[cfg(feature = "cache")]
    pub fn encode_assumptions(&self) -> Result<Vec<u8>, SpeculationError> {
        bincode::serialize(self.assumptions.as_slice())
            .map_err(|e| SpeculationError::Cache(e.to_string()))
    }
}

/// Read back assumptions written by [`CompiledUnit::encode_assumptions`].
#[cfg(feature = "cache")]
pub fn decode_assumptions(bytes: &[u8]) -> Result<Assumptions, SpeculationError> {
    let records: Vec<tern_ir::Assumption> =
        bincode::deserialize(bytes).map_err(|e| SpeculationError::Cache(e.to_string()))?;
    Ok(records.into_iter().collect())
}

/// Compile one unit.
pub fn compile_unit(
    mut graph: Graph,
    providers: Providers<'_>,
    config: &SpeculationConfig,
) -> Result<CompiledUnit, SpeculationError> {
    let mut cx = CompileContext::new(providers, config);

    let simplified = canonicalize(&mut graph, &mut cx)?;
    let lowered = lower(&mut graph, &mut cx)?;
    // Lowering exposes new facts (inserted null checks, constant targets).
    let cleaned = canonicalize(&mut graph, &mut cx)?;
    if config.verify_graphs {
        graph.verify()?;
    }

    let assumptions = graph.assumptions().cloned().unwrap_or_default();
    let stats = cx.log.stats();
    tracing::debug!(
        simplified,
        lowered,
        cleaned,
        assumptions = assumptions.len(),
        folds = stats.folds(),
        "unit compiled"
    );
    Ok(CompiledUnit {
        graph,
        assumptions,
        stats,
    })
}

/// Compile independent units in parallel. Results are in input order.
pub fn compile_units(
    graphs: Vec<Graph>,
    providers: Providers<'_>,
    config: &SpeculationConfig,
) -> Vec<Result<CompiledUnit, SpeculationError>> {
    graphs
        .into_par_iter()
        .enumerate()
        .map(|(unit, graph)| {
            compile_unit(graph, providers, config).inspect_err(|error| {
                tracing::warn!(unit, %error, "unit abandoned");
            })
        })
        .collect()
}
