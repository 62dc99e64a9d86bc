use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::ensure_config,
    prelude::*,
    quantity::{energy::KilowattHours, power::Kilowatts},
};

/// Decision variable searched over by the optimiser.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
pub enum Parameter {
    /// Installed PV peak capacity, kWp.
    #[serde(rename = "pv_capacity_kw")]
    #[value(name = "pv-capacity")]
    PvCapacity,

    /// Usable storage capacity, kWh.
    #[serde(rename = "storage_capacity_kwh")]
    #[value(name = "storage-capacity")]
    StorageCapacity,
}

impl Parameter {
    pub const fn name(self) -> &'static str {
        match self {
            Self::PvCapacity => "pv_capacity_kw",
            Self::StorageCapacity => "storage_capacity_kwh",
        }
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Candidate plant design.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize, bon::Builder)]
pub struct DesignParameters {
    #[serde(rename = "pv_capacity_kw")]
    #[builder(default)]
    pub pv_capacity: Kilowatts,

    #[serde(rename = "storage_capacity_kwh", default)]
    #[builder(default)]
    pub storage_capacity: KilowattHours,
}

impl DesignParameters {
    pub const fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::PvCapacity => self.pv_capacity.0,
            Parameter::StorageCapacity => self.storage_capacity.0,
        }
    }

    pub const fn with(mut self, parameter: Parameter, value: f64) -> Self {
        match parameter {
            Parameter::PvCapacity => self.pv_capacity.0 = value,
            Parameter::StorageCapacity => self.storage_capacity.0 = value,
        }
        self
    }

    pub const fn has_storage(&self) -> bool {
        self.storage_capacity.0 > 0.0
    }

    /// Reject negative and non-finite values.
    pub fn validate(&self) -> Result {
        for parameter in [Parameter::PvCapacity, Parameter::StorageCapacity] {
            let value = self.get(parameter);
            ensure_config!(
                value.is_finite() && value >= 0.0,
                parameter.name(),
                value,
                "must be finite and non-negative",
            );
        }
        Ok(())
    }
}

impl Display for DesignParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PV {}, storage {}", self.pv_capacity, self.storage_capacity)
    }
}

/// Declared search interval of a single parameter.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub min: f64,
    pub max: f64,

    /// Makes the dimension discrete: values are snapped to `min + k * step`.
    #[serde(default)]
    pub step: Option<f64>,
}

impl Bound {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max, step: None }
    }

    #[must_use]
    pub const fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Snap the value onto the dimension grid and clamp it into the bound.
    ///
    /// The result always satisfies [`Bound::contains`].
    pub fn snap(&self, value: f64) -> f64 {
        let value = if value.is_finite() { value.clamp(self.min, self.max) } else { self.min };
        match self.step {
            Some(step) => {
                let max_index = (self.span() / step).floor();
                let index = ((value - self.min) / step).round().clamp(0.0, max_index);
                (index.mul_add(step, self.min)).clamp(self.min, self.max)
            }
            None => value,
        }
    }

    /// Evenly spaced snapped values across the bound, duplicates removed.
    pub fn linspace(&self, n_points: usize) -> Vec<f64> {
        let mut values: Vec<f64> = if n_points <= 1 || self.span() == 0.0 {
            vec![self.snap(self.min + 0.5 * self.span())]
        } else {
            #[expect(clippy::cast_precision_loss)]
            let increment = self.span() / (n_points - 1) as f64;
            #[expect(clippy::cast_precision_loss)]
            (0..n_points).map(|i| self.snap((i as f64).mul_add(increment, self.min))).collect()
        };
        values.dedup();
        values
    }

    fn validate(&self, parameter: Parameter) -> Result {
        let field = |suffix: &str| format!("bounds.{parameter}.{suffix}");
        ensure_config!(
            self.min.is_finite() && self.min >= 0.0,
            field("min"),
            self.min,
            "must be finite and non-negative",
        );
        ensure_config!(
            self.max.is_finite() && self.max >= self.min,
            field("max"),
            self.max,
            format!("must be finite and not less than min ({})", self.min),
        );
        if let Some(step) = self.step {
            ensure_config!(
                step.is_finite() && step > 0.0,
                field("step"),
                step,
                "must be finite and positive",
            );
        }
        Ok(())
    }
}

/// Search space: the declared parameters and their bounds.
///
/// Parameters absent from the map are held at zero.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bounds(BTreeMap<Parameter, Bound>);

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, parameter: Parameter, bound: Bound) -> Self {
        self.0.insert(parameter, bound);
        self
    }

    pub fn get(&self, parameter: Parameter) -> Option<&Bound> {
        self.0.get(&parameter)
    }

    /// Declared dimensions in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, &Bound)> {
        self.0.iter().map(|(parameter, bound)| (*parameter, bound))
    }

    pub fn n_dimensions(&self) -> usize {
        self.0.len()
    }

    pub fn validate(&self) -> Result {
        ensure_config!(
            !self.0.is_empty(),
            "bounds",
            "{}",
            "at least one parameter must be declared",
        );
        for (parameter, bound) in self.iter() {
            bound.validate(parameter)?;
        }
        Ok(())
    }

    /// Snap every declared dimension and zero the undeclared ones.
    pub fn snap(&self, parameters: &DesignParameters) -> DesignParameters {
        self.iter().fold(DesignParameters::default(), |snapped, (parameter, bound)| {
            snapped.with(parameter, bound.snap(parameters.get(parameter)))
        })
    }

    /// Fail with a configuration error if the design lies outside of the search space.
    pub fn check(&self, parameters: &DesignParameters) -> Result {
        parameters.validate()?;
        for parameter in [Parameter::PvCapacity, Parameter::StorageCapacity] {
            let value = parameters.get(parameter);
            match self.get(parameter) {
                Some(bound) => ensure_config!(
                    bound.contains(value),
                    parameter.name(),
                    value,
                    format!("must lie within [{}, {}]", bound.min, bound.max),
                ),
                None => ensure_config!(
                    value == 0.0,
                    parameter.name(),
                    value,
                    "must be zero when the parameter has no declared bounds",
                ),
            }
        }
        Ok(())
    }

    pub fn contains(&self, parameters: &DesignParameters) -> bool {
        self.check(parameters).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_snap_continuous() {
        let bound = Bound::new(0.0, 20.0);
        assert_abs_diff_eq!(bound.snap(-3.0), 0.0);
        assert_abs_diff_eq!(bound.snap(7.25), 7.25);
        assert_abs_diff_eq!(bound.snap(25.0), 20.0);
        assert_abs_diff_eq!(bound.snap(f64::NAN), 0.0);
    }

    #[test]
    fn test_snap_discrete_never_exceeds_max() {
        let bound = Bound::new(1.0, 10.0).with_step(4.0);
        assert_abs_diff_eq!(bound.snap(4.0), 5.0);
        assert_abs_diff_eq!(bound.snap(10.0), 9.0);
        assert_abs_diff_eq!(bound.snap(0.0), 1.0);
    }

    #[test]
    fn test_linspace() {
        assert_eq!(Bound::new(0.0, 20.0).linspace(5), vec![0.0, 5.0, 10.0, 15.0, 20.0]);
        assert_eq!(Bound::new(0.0, 20.0).linspace(1), vec![10.0]);
        assert_eq!(Bound::new(3.0, 3.0).linspace(5), vec![3.0]);
    }

    #[test]
    fn test_linspace_discrete_deduplicates() {
        assert_eq!(Bound::new(0.0, 2.0).with_step(1.0).linspace(5), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_validate_rejects_inverted_bound() {
        let bounds = Bounds::new().with(Parameter::PvCapacity, Bound::new(5.0, 1.0));
        let error = bounds.validate().unwrap_err();
        assert!(
            matches!(error, Error::Configuration { ref field, .. } if field == "bounds.pv_capacity_kw.max")
        );
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(Bounds::new().validate().is_err());
    }

    #[test]
    fn test_check() {
        let bounds = Bounds::new().with(Parameter::PvCapacity, Bound::new(0.0, 20.0));
        assert!(bounds.contains(&DesignParameters::builder().pv_capacity(Kilowatts::from(5.0)).build()));
        assert!(!bounds.contains(&DesignParameters::builder().pv_capacity(Kilowatts::from(25.0)).build()));
        assert!(
            !bounds.contains(
                &DesignParameters::builder()
                    .pv_capacity(Kilowatts::from(5.0))
                    .storage_capacity(KilowattHours::from(1.0))
                    .build()
            )
        );
    }

    #[test]
    fn test_negative_parameter_is_rejected() {
        let parameters = DesignParameters::builder().pv_capacity(Kilowatts::from(-1.0)).build();
        assert!(parameters.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_snap_zeroes_undeclared() {
        let bounds = Bounds::new().with(Parameter::PvCapacity, Bound::new(0.0, 20.0));
        let snapped = bounds.snap(
            &DesignParameters::builder()
                .pv_capacity(Kilowatts::from(30.0))
                .storage_capacity(KilowattHours::from(4.0))
                .build(),
        );
        assert_eq!(snapped.pv_capacity, Kilowatts::from(20.0));
        assert_eq!(snapped.storage_capacity, KilowattHours::ZERO);
    }

    #[test]
    fn test_bounds_from_toml() {
        let bounds: Bounds = toml::from_str(
            r"
            [pv_capacity_kw]
            min = 0.0
            max = 20.0

            [storage_capacity_kwh]
            min = 0.0
            max = 10.0
            step = 2.5
            ",
        )
        .unwrap();
        assert_eq!(bounds.n_dimensions(), 2);
        assert_eq!(bounds.get(Parameter::StorageCapacity).unwrap().step, Some(2.5));
    }
}
