use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};

use crate::quantity::energy::KilowattHours;

/// Energy flows of a single simulated step.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub load: KilowattHours,
    pub generation: KilowattHours,

    /// Load served on site: directly by PV or by discharging the storage.
    pub self_consumed: KilowattHours,

    pub import: KilowattHours,
    pub export: KilowattHours,

    /// Energy taken from the PV surplus into the storage.
    pub charge: KilowattHours,

    /// Energy delivered from the storage to the load.
    pub discharge: KilowattHours,

    /// PV surplus that could neither be stored nor exported.
    pub curtailed: KilowattHours,

    /// Residual stored energy at the end of the step.
    pub state_of_charge: KilowattHours,
}

impl Step {
    /// Difference between the sources and the sinks, should be zero.
    pub fn conservation_residual(&self) -> KilowattHours {
        (self.generation + self.import + self.discharge)
            - (self.load + self.export + self.charge + self.curtailed)
    }
}

/// Annual sums of the step flows.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub load: KilowattHours,
    pub generation: KilowattHours,
    pub self_consumed: KilowattHours,
    pub import: KilowattHours,
    pub export: KilowattHours,
    pub charge: KilowattHours,
    pub discharge: KilowattHours,
    pub curtailed: KilowattHours,
}

impl Totals {
    /// Total load served, whatever the source.
    pub fn delivered(&self) -> KilowattHours {
        self.self_consumed + self.import
    }
}

impl<'a> FromIterator<&'a Step> for Totals {
    fn from_iter<T: IntoIterator<Item = &'a Step>>(steps: T) -> Self {
        steps.into_iter().fold(Self::default(), |mut totals, step| {
            totals.load += step.load;
            totals.generation += step.generation;
            totals.self_consumed += step.self_consumed;
            totals.import += step.import;
            totals.export += step.export;
            totals.charge += step.charge;
            totals.discharge += step.discharge;
            totals.curtailed += step.curtailed;
            totals
        })
    }
}

/// Simulated year.
#[serde_as]
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnergyBalance {
    #[serde_as(as = "DurationSeconds<i64>")]
    #[serde(rename = "time_step_seconds")]
    pub time_step: TimeDelta,

    pub steps: Vec<Step>,
}

impl EnergyBalance {
    pub fn totals(&self) -> Totals {
        self.steps.iter().collect()
    }

    /// Largest absolute conservation residual over all the steps.
    pub fn max_conservation_residual(&self) -> KilowattHours {
        self.steps
            .iter()
            .map(|step| KilowattHours::from(step.conservation_residual().0.abs()))
            .fold(KilowattHours::ZERO, KilowattHours::max)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_totals() {
        let balance = EnergyBalance {
            time_step: TimeDelta::hours(1),
            steps: vec![
                Step {
                    load: KilowattHours::from(2.0),
                    generation: KilowattHours::from(3.0),
                    self_consumed: KilowattHours::from(2.0),
                    export: KilowattHours::from(1.0),
                    ..Step::default()
                },
                Step {
                    load: KilowattHours::from(2.0),
                    import: KilowattHours::from(2.0),
                    ..Step::default()
                },
            ],
        };
        let totals = balance.totals();
        assert_abs_diff_eq!(totals.load.0, 4.0);
        assert_abs_diff_eq!(totals.generation.0, 3.0);
        assert_abs_diff_eq!(totals.delivered().0, 4.0);
        assert_abs_diff_eq!(balance.max_conservation_residual().0, 0.0);
    }

    #[test]
    fn test_conservation_residual_detects_leak() {
        let step = Step {
            load: KilowattHours::from(1.0),
            generation: KilowattHours::from(2.0),
            self_consumed: KilowattHours::from(1.0),
            ..Step::default()
        };
        assert_abs_diff_eq!(step.conservation_residual().0, 1.0);
    }
}
