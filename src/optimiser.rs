mod cancellation;
mod config;
mod population;

use itertools::Itertools;
use rand::{SeedableRng, rngs::StdRng};
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use serde::{Deserialize, Serialize};

pub use self::{cancellation::Cancellation, config::OptimiserConfig};
use self::population::{Population, Solution, breed};
use crate::{
    core::design::{Bounds, DesignParameters},
    error::ensure_config,
    prelude::*,
};

/// Why the search stopped.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    Converged,
    BudgetExhausted,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub evaluations: usize,
    pub failed_evaluations: usize,
    pub generations: usize,
    pub converged: bool,
    pub termination: Termination,

    /// Best score after each generation.
    pub history: Vec<f64>,
}

/// Best candidate found by [`optimise`].
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Search {
    pub best: DesignParameters,
    pub score: f64,
    pub diagnostics: Diagnostics,
}

/// Minimise the score over the bounded search space.
///
/// The first generation is a lattice scan, the following ones are bred from the elite population.
/// Candidates of a generation are evaluated in parallel, while the results are consumed in the proposal
/// order, which keeps the search deterministic for a fixed seed.
///
/// Failed candidates and non-finite scores are skipped, however, a generation without a single
/// successful evaluation fails the whole run.
/// Worker pool of the given size, or one thread per logical CPU.
pub(crate) fn thread_pool(threads: Option<usize>) -> Result<ThreadPool> {
    if let Some(threads) = threads {
        ensure_config!(threads >= 1, "optimiser.threads", threads, "must be at least 1");
    }
    ThreadPoolBuilder::new().num_threads(threads.unwrap_or_default()).build().map_err(|error| {
        Error::configuration("optimiser.threads", format!("{threads:?}"), error.to_string())
    })
}

#[instrument(
    skip_all,
    name = "Optimising…",
    fields(n_dimensions = bounds.n_dimensions(), seed = config.seed),
)]
pub fn optimise<F>(
    bounds: &Bounds,
    evaluate: F,
    config: &OptimiserConfig,
    cancellation: &Cancellation,
) -> Result<Search>
where
    F: Fn(&DesignParameters) -> Result<f64> + Sync,
{
    bounds.validate()?;
    config.validate()?;

    let pool = thread_pool(config.threads)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut population = Population::new(config.population_size);
    let mut best: Option<Solution> = None;
    let mut evaluations = 0;
    let mut failed_evaluations = 0;
    let mut history = Vec::new();
    let mut candidates = lattice(bounds, config.grid_points, config.max_evaluations);

    let (termination, best) = loop {
        let scores: Vec<Result<f64>> =
            pool.install(|| candidates.par_iter().map(&evaluate).collect());

        let mut last_failure = None;
        let mut n_succeeded = 0;
        for (parameters, score) in candidates.iter().zip(scores) {
            evaluations += 1;
            let score = score.and_then(|score| {
                if score.is_finite() {
                    Ok(score)
                } else {
                    Err(Error::Evaluation(format!("non-finite score {score}")))
                }
            });
            match score {
                Ok(score) => {
                    n_succeeded += 1;
                    let solution = Solution::new(*parameters, score);
                    population.push(solution);
                    if best.is_none_or(|best| score < best.score - config.tie_tolerance) {
                        trace!(%parameters, score, "new best");
                        best = Some(solution);
                    }
                }
                Err(error) => {
                    debug!(%parameters, %error, "candidate failed");
                    failed_evaluations += 1;
                    last_failure = Some(error);
                }
            }
        }
        // Earlier generations do not save a run whose latest generation failed entirely:
        let (Some(current_best), 1..) = (best, n_succeeded) else {
            return Err(Error::OptimisationFailed {
                evaluations,
                reason: last_failure
                    .map_or_else(|| "no candidates proposed".to_string(), |error| error.to_string()),
            });
        };
        history.push(current_best.score);
        debug!(
            generation = history.len(),
            evaluations,
            best_score = current_best.score,
            best = %current_best.parameters,
            "generation evaluated",
        );

        if cancellation.is_cancelled() {
            break (Termination::Cancelled, current_best);
        }
        if is_converged(&history, config.convergence_window, config.epsilon) {
            break (Termination::Converged, current_best);
        }
        if evaluations >= config.max_evaluations {
            break (Termination::BudgetExhausted, current_best);
        }

        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let relative_sigma =
            config.mutation_scale * config.mutation_decay.powi((history.len() - 1) as i32);
        let n_children = config.population_size.min(config.max_evaluations - evaluations);
        candidates = (0..n_children)
            .filter_map(|_| {
                let lhs = *population.select(config.tournament_size, &mut rng)?;
                let rhs = *population.select(config.tournament_size, &mut rng)?;
                Some(breed(bounds, &lhs, &rhs, relative_sigma, &mut rng))
            })
            .collect();
    };

    info!(
        evaluations,
        failed_evaluations,
        generations = history.len(),
        ?termination,
        score = best.score,
        best = %best.parameters,
        "optimised",
    );
    Ok(Search {
        best: best.parameters,
        score: best.score,
        diagnostics: Diagnostics {
            evaluations,
            failed_evaluations,
            generations: history.len(),
            converged: termination == Termination::Converged,
            termination,
            history,
        },
    })
}

/// Regular lattice over the declared dimensions that fits into the evaluation budget.
fn lattice(bounds: &Bounds, max_points: usize, budget: usize) -> Vec<DesignParameters> {
    let n_dimensions = u32::try_from(bounds.n_dimensions()).unwrap_or(u32::MAX);
    let n_points = (1..=max_points.max(1))
        .rev()
        .find(|n_points| n_points.checked_pow(n_dimensions).is_some_and(|size| size <= budget))
        .unwrap_or(1);
    bounds
        .iter()
        .map(|(parameter, bound)| {
            bound.linspace(n_points).into_iter().map(move |value| (parameter, value)).collect_vec()
        })
        .multi_cartesian_product()
        .map(|point| {
            point
                .into_iter()
                .fold(DesignParameters::default(), |parameters, (parameter, value)| {
                    parameters.with(parameter, value)
                })
        })
        .take(budget)
        .collect()
}

/// The best score has not improved by more than `epsilon` over the last `window` generations.
fn is_converged(history: &[f64], window: usize, epsilon: f64) -> bool {
    history.len() > window && {
        let latest = history[history.len() - 1];
        let reference = history[history.len() - 1 - window];
        reference - latest <= epsilon
    }
}
