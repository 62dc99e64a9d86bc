use serde::{Deserialize, Serialize};

use crate::{error::ensure_config, prelude::*};

/// Search settings: lattice scan followed by the evolutionary refinement.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(default)]
pub struct OptimiserConfig {
    /// Seed of the only random number generator of a run.
    #[builder(default = 42)]
    pub seed: u64,

    /// Evaluation budget, always at least one evaluation is performed.
    #[builder(default = 500)]
    pub max_evaluations: usize,

    /// Number of the retained candidates and the size of each evolutionary generation.
    #[builder(default = 16)]
    pub population_size: usize,

    /// Maximal number of the lattice points per dimension in the initial scan.
    #[builder(default = 9)]
    pub grid_points: usize,

    /// Number of generations over which the best score must improve by more than [`Self::epsilon`].
    #[builder(default = 5)]
    pub convergence_window: usize,

    #[builder(default = 1e-6)]
    pub epsilon: f64,

    /// Initial mutation standard deviation relative to the bound span.
    #[builder(default = 0.25)]
    pub mutation_scale: f64,

    /// Per-generation multiplier of the mutation scale.
    #[builder(default = 0.8)]
    pub mutation_decay: f64,

    #[builder(default = 3)]
    pub tournament_size: usize,

    /// A candidate must be better than the best by more than this to replace it.
    #[builder(default = 1e-9)]
    pub tie_tolerance: f64,

    /// Worker threads, defaults to the number of logical CPUs.
    pub threads: Option<usize>,
}

impl Default for OptimiserConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl OptimiserConfig {
    pub fn validate(&self) -> Result {
        for (field, value) in [
            ("optimiser.max_evaluations", self.max_evaluations),
            ("optimiser.grid_points", self.grid_points),
            ("optimiser.convergence_window", self.convergence_window),
            ("optimiser.tournament_size", self.tournament_size),
        ] {
            ensure_config!(value >= 1, field, value, "must be at least 1");
        }
        ensure_config!(
            self.population_size >= 2,
            "optimiser.population_size",
            self.population_size,
            "must be at least 2",
        );
        for (field, value) in [
            ("optimiser.epsilon", self.epsilon),
            ("optimiser.tie_tolerance", self.tie_tolerance),
            ("optimiser.mutation_scale", self.mutation_scale),
        ] {
            ensure_config!(
                value.is_finite() && value >= 0.0,
                field,
                value,
                "must be finite and non-negative",
            );
        }
        ensure_config!(
            self.mutation_decay > 0.0 && self.mutation_decay <= 1.0,
            "optimiser.mutation_decay",
            self.mutation_decay,
            "must lie within (0, 1]",
        );
        if let Some(threads) = self.threads {
            ensure_config!(threads >= 1, "optimiser.threads", threads, "must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(OptimiserConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let config = OptimiserConfig::builder().max_evaluations(0).build();
        let error = config.validate().unwrap_err();
        assert!(
            matches!(error, Error::Configuration { ref field, .. } if field == "optimiser.max_evaluations")
        );
    }

    #[test]
    fn test_partial_toml() {
        let config: OptimiserConfig = toml::from_str("seed = 7\nmax_evaluations = 100").unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_evaluations, 100);
        assert_eq!(config.population_size, 16);
    }
}
