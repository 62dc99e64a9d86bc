use std::iter::Sum;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};

use crate::{error::ensure_config, prelude::*, quantity::Quantity};

/// Samples at a fixed time step, starting at the beginning of the representative year.
#[serde_as]
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries<V> {
    #[serde_as(as = "DurationSeconds<i64>")]
    #[serde(rename = "time_step_seconds")]
    pub time_step: TimeDelta,

    pub values: Vec<V>,
}

impl<V> TimeSeries<V> {
    pub const fn new(time_step: TimeDelta, values: Vec<V>) -> Self {
        Self { time_step, values }
    }

    pub fn hourly(values: Vec<V>) -> Self {
        Self::new(TimeDelta::hours(1), values)
    }

    pub const fn len(&self) -> usize {
        self.values.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.values.iter()
    }

    /// Ensure that both series can be stepped through together.
    pub fn ensure_aligned_with<R>(&self, rhs: &TimeSeries<R>, name: &str) -> Result {
        ensure_config!(
            self.time_step == rhs.time_step,
            format!("{name}.time_step"),
            format!("{}s", rhs.time_step.num_seconds()),
            format!("must match the other series ({}s)", self.time_step.num_seconds()),
        );
        ensure_config!(
            self.len() == rhs.len(),
            format!("{name}.len"),
            rhs.len(),
            format!("must match the other series ({})", self.len()),
        );
        Ok(())
    }

    pub fn map<T>(self, f: impl FnMut(V) -> T) -> TimeSeries<T> {
        TimeSeries { time_step: self.time_step, values: self.values.into_iter().map(f).collect() }
    }
}

impl<V: Copy + Sum> TimeSeries<V> {
    pub fn sum(&self) -> V {
        self.values.iter().copied().sum()
    }
}

impl<const POWER: isize, const TIME: isize, const COST: isize>
    TimeSeries<Quantity<POWER, TIME, COST>>
{
    /// Check the structural and per-sample invariants, naming the series in the error.
    pub fn validate(&self, name: &str) -> Result {
        ensure_config!(
            self.time_step > TimeDelta::zero(),
            format!("{name}.time_step"),
            format!("{}s", self.time_step.num_seconds()),
            "must be positive",
        );
        ensure_config!(!self.is_empty(), format!("{name}.len"), 0, "must not be empty");
        if let Some((index, value)) = self
            .values
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite() || !value.is_non_negative())
        {
            return Err(Error::configuration(
                format!("{name}[{index}]"),
                value.0,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

impl<'a, V> IntoIterator for &'a TimeSeries<V> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
