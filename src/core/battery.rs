use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{
    error::ensure_config,
    prelude::*,
    quantity::{energy::KilowattHours, power::Kilowatts},
};

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(default)]
pub struct StorageParameters {
    /// Maximal charging power relative to the capacity, 1/h.
    #[builder(default = 0.5)]
    pub charge_c_rate: f64,

    /// Maximal discharging power relative to the capacity, 1/h.
    #[builder(default = 0.5)]
    pub discharge_c_rate: f64,

    /// Conversion coefficient of external energy to stored energy while charging.
    #[builder(default = 1.0)]
    pub charge_efficiency: f64,

    /// Conversion coefficient of stored energy to external energy while discharging.
    #[builder(default = 1.0)]
    pub discharge_efficiency: f64,

    /// Reserve that is never discharged, as a fraction of the capacity.
    #[builder(default = 0.0)]
    pub min_state_of_charge: f64,
}

impl Default for StorageParameters {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl StorageParameters {
    pub fn validate(&self) -> Result {
        for (field, value) in [
            ("storage.charge_c_rate", self.charge_c_rate),
            ("storage.discharge_c_rate", self.discharge_c_rate),
        ] {
            ensure_config!(
                value.is_finite() && value >= 0.0,
                field,
                value,
                "must be finite and non-negative",
            );
        }
        for (field, value) in [
            ("storage.charge_efficiency", self.charge_efficiency),
            ("storage.discharge_efficiency", self.discharge_efficiency),
        ] {
            ensure_config!(value > 0.0 && value <= 1.0, field, value, "must lie within (0, 1]");
        }
        ensure_config!(
            (0.0..1.0).contains(&self.min_state_of_charge),
            "storage.min_state_of_charge",
            self.min_state_of_charge,
            "must lie within [0, 1)",
        );
        Ok(())
    }
}

/// Storage simulator with greedy dispatch.
///
/// All the energies passed in and returned are measured at the storage terminals,
/// conversion losses only affect the residual energy.
#[derive(Clone)]
pub struct Battery {
    capacity: KilowattHours,

    /// Minimally allowed residual energy.
    min_residual_energy: KilowattHours,

    /// Current residual energy.
    residual_energy: KilowattHours,

    max_charge: KilowattHours,
    max_discharge: KilowattHours,
    parameters: StorageParameters,
}

impl Battery {
    /// Empty battery: the residual energy starts at the reserve.
    pub fn new(
        capacity: KilowattHours,
        parameters: StorageParameters,
        time_step: TimeDelta,
    ) -> Self {
        let min_residual_energy = capacity * parameters.min_state_of_charge;
        Self {
            capacity,
            min_residual_energy,
            residual_energy: min_residual_energy,
            max_charge: Kilowatts::from(capacity.0 * parameters.charge_c_rate) * time_step,
            max_discharge: Kilowatts::from(capacity.0 * parameters.discharge_c_rate) * time_step,
            parameters,
        }
    }

    pub const fn residual_energy(&self) -> KilowattHours {
        self.residual_energy
    }

    /// Absorb as much of the surplus as the headroom and the charge rate allow.
    ///
    /// # Returns
    ///
    /// Energy taken from the surplus.
    #[must_use]
    pub fn charge(&mut self, surplus: KilowattHours) -> KilowattHours {
        let headroom = (self.capacity - self.residual_energy).max(KilowattHours::ZERO)
            / self.parameters.charge_efficiency;
        let absorbed = surplus.min(self.max_charge).min(headroom).max(KilowattHours::ZERO);
        self.residual_energy = (self.residual_energy + absorbed * self.parameters.charge_efficiency)
            .min(self.capacity);
        absorbed
    }

    /// Cover as much of the deficit as the reserve and the discharge rate allow.
    ///
    /// # Returns
    ///
    /// Energy delivered towards the deficit.
    #[must_use]
    pub fn discharge(&mut self, deficit: KilowattHours) -> KilowattHours {
        let available = (self.residual_energy - self.min_residual_energy).max(KilowattHours::ZERO)
            * self.parameters.discharge_efficiency;
        let delivered = deficit.min(self.max_discharge).min(available).max(KilowattHours::ZERO);
        self.residual_energy = (self.residual_energy
            - delivered / self.parameters.discharge_efficiency)
            .max(self.min_residual_energy);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn battery(capacity: f64, parameters: StorageParameters) -> Battery {
        Battery::new(KilowattHours::from(capacity), parameters, TimeDelta::hours(1))
    }

    #[test]
    fn test_starts_empty() {
        let battery = battery(10.0, StorageParameters::default());
        assert_abs_diff_eq!(battery.residual_energy().0, 0.0);
    }

    #[test]
    fn test_charge_is_rate_limited() {
        let mut battery = battery(10.0, StorageParameters::default());
        assert_abs_diff_eq!(battery.charge(KilowattHours::from(8.0)).0, 5.0);
        assert_abs_diff_eq!(battery.residual_energy().0, 5.0);
    }

    #[test]
    fn test_charge_is_capacity_limited() {
        let parameters = StorageParameters::builder().charge_c_rate(1.0).build();
        let mut battery = battery(4.0, parameters);
        assert_abs_diff_eq!(battery.charge(KilowattHours::from(3.0)).0, 3.0);
        assert_abs_diff_eq!(battery.charge(KilowattHours::from(3.0)).0, 1.0);
        assert_abs_diff_eq!(battery.residual_energy().0, 4.0);
    }

    #[test]
    fn test_discharge_stops_at_reserve() {
        let parameters = StorageParameters::builder()
            .charge_c_rate(1.0)
            .discharge_c_rate(1.0)
            .min_state_of_charge(0.25)
            .build();
        let mut battery = battery(4.0, parameters);
        assert_abs_diff_eq!(battery.residual_energy().0, 1.0);
        assert_abs_diff_eq!(battery.charge(KilowattHours::from(10.0)).0, 3.0);
        assert_abs_diff_eq!(battery.discharge(KilowattHours::from(10.0)).0, 3.0);
        assert_abs_diff_eq!(battery.residual_energy().0, 1.0);
        assert_abs_diff_eq!(battery.discharge(KilowattHours::from(10.0)).0, 0.0);
    }

    #[test]
    fn test_efficiency_losses() {
        let parameters = StorageParameters::builder()
            .charge_c_rate(1.0)
            .discharge_c_rate(1.0)
            .charge_efficiency(0.9)
            .discharge_efficiency(0.9)
            .build();
        let mut battery = battery(10.0, parameters);
        assert_abs_diff_eq!(battery.charge(KilowattHours::from(5.0)).0, 5.0);
        assert_abs_diff_eq!(battery.residual_energy().0, 4.5);
        assert_abs_diff_eq!(battery.discharge(KilowattHours::from(10.0)).0, 4.05, epsilon = 1e-12);
        assert_abs_diff_eq!(battery.residual_energy().0, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_half_hour_step_halves_the_rate_limit() {
        let mut battery = Battery::new(
            KilowattHours::from(10.0),
            StorageParameters::default(),
            TimeDelta::minutes(30),
        );
        assert_abs_diff_eq!(battery.charge(KilowattHours::from(8.0)).0, 2.5);
    }

    #[test]
    fn test_validate() {
        assert!(StorageParameters::default().validate().is_ok());
        let parameters = StorageParameters::builder().charge_efficiency(1.5).build();
        assert!(parameters.validate().unwrap_err().is_configuration());
        let parameters = StorageParameters::builder().min_state_of_charge(1.0).build();
        assert!(parameters.validate().is_err());
    }
}
