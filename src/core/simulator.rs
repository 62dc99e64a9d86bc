use serde::{Deserialize, Serialize};

use crate::{
    core::{
        balance::{EnergyBalance, Step},
        battery::{Battery, StorageParameters},
        design::DesignParameters,
        series::TimeSeries,
    },
    prelude::*,
    quantity::{energy::KilowattHours, specific_yield::SpecificYield},
};

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(default)]
pub struct SimulationOptions {
    /// Whether the surplus may be fed into the grid. Otherwise, it gets curtailed.
    #[builder(default = true)]
    pub export_enabled: bool,

    #[builder(default)]
    pub storage: StorageParameters,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Simulate the representative year for the given design.
///
/// The load and the specific generation must be aligned, see [`TimeSeries::ensure_aligned_with`].
pub fn simulate(
    parameters: &DesignParameters,
    load: &TimeSeries<KilowattHours>,
    specific_generation: &TimeSeries<SpecificYield>,
    options: &SimulationOptions,
) -> Result<EnergyBalance> {
    parameters.validate()?;
    load.ensure_aligned_with(specific_generation, "specific_generation")?;

    let mut battery = parameters.has_storage().then(|| {
        Battery::new(parameters.storage_capacity, options.storage, load.time_step)
    });

    let steps = load
        .iter()
        .zip(specific_generation)
        .map(|(load, specific_yield)| {
            let load = *load;
            let generation = parameters.pv_capacity * *specific_yield;

            let direct = generation.min(load);
            let surplus = generation - direct;
            let deficit = load - direct;

            // Greedy: surplus goes to the storage first, deficit is covered from the storage first.
            let (charge, discharge) = battery.as_mut().map_or(
                (KilowattHours::ZERO, KilowattHours::ZERO),
                |battery| (battery.charge(surplus), battery.discharge(deficit)),
            );
            let export = if options.export_enabled { surplus - charge } else { KilowattHours::ZERO };

            Step {
                load,
                generation,
                self_consumed: direct + discharge,
                import: deficit - discharge,
                export,
                charge,
                discharge,
                curtailed: surplus - charge - export,
                state_of_charge: battery
                    .as_ref()
                    .map_or(KilowattHours::ZERO, Battery::residual_energy),
            }
        })
        .collect();

    Ok(EnergyBalance { time_step: load.time_step, steps })
}
