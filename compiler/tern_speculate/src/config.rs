//! Speculation settings for one compilation.

/// Environment variable that disables call-site target folding when set.
pub const NO_CALL_SITE_FOLD_VAR: &str = "TERN_NO_CALL_SITE_FOLD";

/// Environment variable that forces graph verification on (`1`, `true`)
/// or off (`0`, `false`).
pub const VERIFY_GRAPH_VAR: &str = "TERN_VERIFY_GRAPH";

/// Configuration for the canonicalize/lower pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeculationConfig {
    /// Fold `CallSiteTarget` nodes whose call site is a known constant.
    /// When off, every such node lowers to a dispatch.
    pub fold_call_site_targets: bool,
    /// Worklist rounds a single canonicalization may take before it is
    /// treated as diverging.
    pub max_canonicalizer_rounds: usize,
    /// Run [`Graph::verify`](tern_ir::Graph::verify) at the end of the
    /// pipeline.
    pub verify_graphs: bool,
}

impl Default for SpeculationConfig {
    fn default() -> Self {
        SpeculationConfig {
            fold_call_site_targets: true,
            max_canonicalizer_rounds: 16,
            verify_graphs: cfg!(debug_assertions),
        }
    }
}

impl SpeculationConfig {
    /// Never speculate; every call-site read becomes a real dispatch.
    pub fn conservative() -> Self {
        SpeculationConfig {
            fold_call_site_targets: false,
            verify_graphs: true,
            ..Self::default()
        }
    }

    /// Defaults, overridden by `TERN_NO_CALL_SITE_FOLD` and
    /// `TERN_VERIFY_GRAPH`.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if lookup(NO_CALL_SITE_FOLD_VAR).is_some() {
            config.fold_call_site_targets = false;
        }
        if let Some(value) = lookup(VERIFY_GRAPH_VAR) {
            config.verify_graphs = !matches!(value.trim(), "0" | "false" | "off");
        }
        config
    }
}
