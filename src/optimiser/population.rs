use std::{cmp::Ordering, collections::BinaryHeap};

use ordered_float::OrderedFloat;
use rand::{Rng, rngs::StdRng, seq::SliceRandom};
use rand_distr::{Distribution, Normal};

use crate::core::design::{Bounds, DesignParameters};

/// Blend crossover extends the parents' interval by this fraction on both sides.
const BLEND_ALPHA: f64 = 0.25;

/// Evaluated candidate.
#[derive(Copy, Clone, Debug, derive_more::Constructor)]
pub struct Solution {
    pub parameters: DesignParameters,
    pub score: f64,
}

impl PartialEq<Self> for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Solution {}

impl PartialOrd<Self> for Solution {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Solution {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score)
    }
}

/// Elite of the best solutions seen so far, the worst one is evicted on overflow.
pub struct Population {
    capacity: usize,
    solutions: BinaryHeap<Solution>,
}

impl Population {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, solutions: BinaryHeap::with_capacity(capacity + 1) }
    }

    pub fn push(&mut self, solution: Solution) {
        self.solutions.push(solution);
        while self.solutions.len() > self.capacity {
            self.solutions.pop();
        }
    }

    /// Tournament selection: the best of `size` uniformly drawn members, the first drawn wins ties.
    pub fn select(&self, size: usize, rng: &mut StdRng) -> Option<&DesignParameters> {
        let members = self.solutions.as_slice();
        (0..size)
            .filter_map(|_| members.choose(rng))
            .min_by_key(|solution| OrderedFloat(solution.score))
            .map(|solution| &solution.parameters)
    }
}

/// Blend crossover of the parents followed by the Gaussian mutation.
///
/// The mutation standard deviation is `relative_sigma` times the span of each bound.
/// The child is snapped onto the search space.
pub fn breed(
    bounds: &Bounds,
    lhs: &DesignParameters,
    rhs: &DesignParameters,
    relative_sigma: f64,
    rng: &mut StdRng,
) -> DesignParameters {
    let child = bounds.iter().fold(DesignParameters::default(), |child, (parameter, bound)| {
        let (lhs, rhs) = (lhs.get(parameter), rhs.get(parameter));
        let blend = rng.gen_range(-BLEND_ALPHA..=(1.0 + BLEND_ALPHA));
        let noise = Normal::new(0.0, relative_sigma * bound.span())
            .map_or(0.0, |normal| normal.sample(rng));
        child.with(parameter, blend.mul_add(rhs - lhs, lhs) + noise)
    });
    bounds.snap(&child)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::{
        core::design::{Bound, Parameter},
        quantity::power::Kilowatts,
    };

    fn pv(capacity: f64) -> DesignParameters {
        DesignParameters::builder().pv_capacity(Kilowatts::from(capacity)).build()
    }

    #[test]
    fn test_population_evicts_the_worst() {
        let mut population = Population::new(2);
        population.push(Solution::new(pv(1.0), 3.0));
        population.push(Solution::new(pv(2.0), 1.0));
        population.push(Solution::new(pv(3.0), 2.0));
        assert_eq!(population.solutions.len(), 2);
        let mut scores: Vec<f64> =
            population.solutions.iter().map(|solution| solution.score).collect();
        scores.sort_by(f64::total_cmp);
        assert_eq!(scores, vec![1.0, 2.0]);
    }

    #[test]
    fn test_select_from_single_member() {
        let mut population = Population::new(4);
        population.push(Solution::new(pv(5.0), 0.0));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(population.select(3, &mut rng), Some(&pv(5.0)));
    }

    #[test]
    fn test_select_from_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Population::new(4).select(3, &mut rng), None);
    }

    #[test]
    fn test_children_stay_within_bounds() {
        let bounds = Bounds::new().with(Parameter::PvCapacity, Bound::new(2.0, 8.0).with_step(0.5));
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let child = breed(&bounds, &pv(2.0), &pv(8.0), 1.0, &mut rng);
            assert!(bounds.contains(&child));
            let steps = (child.pv_capacity.0 - 2.0) / 0.5;
            assert!((steps - steps.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_identical_parents_without_mutation() {
        let bounds = Bounds::new().with(Parameter::PvCapacity, Bound::new(0.0, 10.0));
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(breed(&bounds, &pv(4.0), &pv(4.0), 0.0, &mut rng), pv(4.0));
    }
}
