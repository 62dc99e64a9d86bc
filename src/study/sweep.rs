use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        design::{DesignParameters, Parameter},
        metrics::Metrics,
    },
    error::ensure_config,
    optimiser::{Cancellation, thread_pool},
    prelude::*,
    study::Study,
};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Spacing {
    #[default]
    Linear,

    /// Geometric progression, denser towards the lower end.
    Logarithmic,
}

/// One-dimensional sizing sweep.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
pub struct Sweep {
    pub parameter: Parameter,
    pub min: f64,
    pub max: f64,

    #[builder(default = 20)]
    pub steps: usize,

    #[builder(default)]
    pub spacing: Spacing,

    /// Values of the other parameters.
    #[builder(default)]
    pub base: DesignParameters,
}

impl Sweep {
    pub fn validate(&self) -> Result {
        ensure_config!(
            self.min.is_finite() && self.min >= 0.0,
            "sweep.min",
            self.min,
            "must be finite and non-negative",
        );
        ensure_config!(
            self.max.is_finite() && self.max >= self.min,
            "sweep.max",
            self.max,
            format!("must be finite and not less than min ({})", self.min),
        );
        ensure_config!(self.steps >= 1, "sweep.steps", self.steps, "must be at least 1");
        if self.spacing == Spacing::Logarithmic {
            ensure_config!(
                self.min > 0.0,
                "sweep.min",
                self.min,
                "must be positive for the logarithmic spacing",
            );
        }
        self.base.validate()
    }

    /// Swept parameter values in ascending order.
    #[expect(clippy::cast_precision_loss)]
    pub fn values(&self) -> Vec<f64> {
        if self.steps == 1 {
            return vec![self.min];
        }
        let last = (self.steps - 1) as f64;
        (0..self.steps)
            .map(|i| {
                let fraction = i as f64 / last;
                match self.spacing {
                    Spacing::Linear => fraction.mul_add(self.max - self.min, self.min),
                    Spacing::Logarithmic => self.min * (self.max / self.min).powf(fraction),
                }
            })
            .collect()
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub parameters: DesignParameters,
    pub score: f64,
    pub metrics: Metrics,
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub parameter: Parameter,
    pub points: Vec<SweepPoint>,

    /// Number of the swept values that could not be evaluated.
    pub n_failed: usize,

    /// Index of the best point, the first one wins on ties.
    pub best: Option<usize>,

    pub cancelled: bool,
}

impl SweepReport {
    pub fn best_point(&self) -> Option<&SweepPoint> {
        self.best.and_then(|index| self.points.get(index))
    }
}

impl Study {
    /// Evaluate the study goal along a single parameter, ignoring the study bounds.
    ///
    /// Once cancelled, the values not yet started are skipped and the report is marked as cancelled.
    #[instrument(
        skip_all,
        name = "Sweeping…",
        fields(parameter = %sweep.parameter, steps = sweep.steps),
    )]
    pub fn sweep(
        &self,
        sweep: &Sweep,
        threads: Option<usize>,
        cancellation: &Cancellation,
    ) -> Result<SweepReport> {
        sweep.validate()?;
        let pool = thread_pool(threads)?;
        let outcomes: Vec<Option<Result<SweepPoint>>> = pool.install(|| {
            sweep
                .values()
                .into_par_iter()
                .map(|value| {
                    if cancellation.is_cancelled() {
                        return None;
                    }
                    Some(self.evaluate(&sweep.base.with(sweep.parameter, value)).map(
                        |evaluation| SweepPoint {
                            parameters: evaluation.parameters,
                            score: evaluation.score,
                            metrics: evaluation.metrics,
                        },
                    ))
                })
                .collect()
        });

        let cancelled = outcomes.iter().any(Option::is_none);
        let mut points = Vec::with_capacity(outcomes.len());
        let mut n_failed = 0;
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(point) if point.score.is_finite() => points.push(point),
                Ok(point) => {
                    warn!(parameters = %point.parameters, score = point.score, "non-finite score");
                    n_failed += 1;
                }
                Err(error) => {
                    warn!(%error, "sweep point failed");
                    n_failed += 1;
                }
            }
        }
        if cancelled {
            warn!(n_points = points.len(), "the sweep was cancelled");
        }
        let best = points
            .iter()
            .enumerate()
            .min_by_key(|(_, point)| OrderedFloat(point.score))
            .map(|(index, _)| index);
        info!(n_points = points.len(), n_failed, ?best, "swept");
        Ok(SweepReport { parameter: sweep.parameter, points, n_failed, best, cancelled })
    }
}
