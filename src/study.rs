mod sensitivity;
mod sweep;

use bon::Builder;
use serde::{Deserialize, Serialize};

pub use self::{
    sensitivity::{CostField, SensitivityPoint, SensitivityReport},
    sweep::{Spacing, Sweep, SweepPoint, SweepReport},
};
use crate::{
    core::{
        balance::EnergyBalance,
        cashflow::Cashflow,
        costs::CostAssumptions,
        design::{Bounds, DesignParameters, Parameter},
        goal::Goal,
        metrics::Metrics,
        series::TimeSeries,
        simulator::{SimulationOptions, simulate},
    },
    optimiser::{Cancellation, Diagnostics, OptimiserConfig, optimise},
    prelude::*,
    quantity::{energy::KilowattHours, specific_yield::SpecificYield},
};

/// Validated feasibility study: the site data, the economics, and the search space.
///
/// Everything here stays immutable for the whole optimisation run.
#[derive(Clone, Debug, Builder)]
#[builder(finish_fn(vis = "", name = build_unchecked))]
pub struct Study {
    load: TimeSeries<KilowattHours>,
    specific_generation: TimeSeries<SpecificYield>,
    costs: CostAssumptions,
    goal: Goal,
    bounds: Bounds,

    #[builder(default)]
    options: SimulationOptions,
}

impl<S: study_builder::IsComplete> StudyBuilder<S> {
    /// Build the study, reporting the first invalid field.
    pub fn try_build(self) -> Result<Study> {
        let study = self.build_unchecked();
        study.validate()?;
        Ok(study)
    }
}

/// Complete evaluation of a single design.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub parameters: DesignParameters,
    pub balance: EnergyBalance,
    pub metrics: Metrics,
    pub score: f64,
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimisationResult {
    pub goal: Goal,
    pub parameters: DesignParameters,
    pub score: f64,
    pub metrics: Metrics,
    pub balance: EnergyBalance,
    pub diagnostics: Diagnostics,
}

impl Study {
    fn validate(&self) -> Result {
        self.load.validate("load")?;
        self.specific_generation.validate("specific_generation")?;
        self.load.ensure_aligned_with(&self.specific_generation, "specific_generation")?;
        self.costs.validate()?;
        self.options.storage.validate()?;
        self.bounds.validate()?;
        Ok(())
    }

    pub const fn goal(&self) -> Goal {
        self.goal
    }

    pub const fn costs(&self) -> &CostAssumptions {
        &self.costs
    }

    pub const fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Same study under different cost assumptions.
    pub fn with_costs(mut self, costs: CostAssumptions) -> Result<Self> {
        costs.validate()?;
        self.costs = costs;
        Ok(self)
    }

    /// Simulate the design and score it against the study goal.
    pub fn evaluate(&self, parameters: &DesignParameters) -> Result<Evaluation> {
        let balance = simulate(parameters, &self.load, &self.specific_generation, &self.options)?;
        let metrics = self.metrics(parameters, &balance)?;
        let score = self.goal.score(&metrics)?;
        Ok(Evaluation { parameters: *parameters, balance, metrics, score })
    }

    /// Like [`Study::evaluate`], but the design must lie within the study bounds.
    pub fn evaluate_within_bounds(&self, parameters: &DesignParameters) -> Result<Evaluation> {
        self.bounds.check(parameters)?;
        self.evaluate(parameters)
    }

    /// Evaluation oracle of the optimiser.
    pub fn score(&self, parameters: &DesignParameters) -> Result<f64> {
        let balance = simulate(parameters, &self.load, &self.specific_generation, &self.options)?;
        self.goal.score(&self.metrics(parameters, &balance)?)
    }

    /// Project the lifetime cash flow, re-simulating the degraded PV output when needed.
    fn metrics(&self, parameters: &DesignParameters, balance: &EnergyBalance) -> Result<Metrics> {
        let cashflow =
            Cashflow::project(parameters, &self.costs, &balance.totals(), |pv_derating| {
                let derated = parameters
                    .with(Parameter::PvCapacity, parameters.pv_capacity.0 * pv_derating);
                let balance =
                    simulate(&derated, &self.load, &self.specific_generation, &self.options)?;
                Ok(balance.totals())
            })?;
        Ok(Metrics::compute(balance, &cashflow, parameters, &self.costs))
    }

    /// Search for the best design and re-simulate it to report the full energy balance.
    #[instrument(skip_all, name = "Optimising the study…", fields(goal = %self.goal))]
    pub fn optimise(
        &self,
        config: &OptimiserConfig,
        cancellation: &Cancellation,
    ) -> Result<OptimisationResult> {
        let search = optimise(&self.bounds, |parameters| self.score(parameters), config, cancellation)?;
        let evaluation = self.evaluate_within_bounds(&search.best)?;
        info!(
            parameters = %evaluation.parameters,
            score = evaluation.score,
            lcoe = ?evaluation.metrics.lcoe,
            self_consumption_rate = evaluation.metrics.self_consumption_rate,
            irr = ?evaluation.metrics.internal_rate_of_return,
            max_residual = ?evaluation.balance.max_conservation_residual(),
            "best design",
        );
        Ok(OptimisationResult {
            goal: self.goal,
            parameters: evaluation.parameters,
            score: evaluation.score,
            metrics: evaluation.metrics,
            balance: evaluation.balance,
            diagnostics: search.diagnostics,
        })
    }
}
