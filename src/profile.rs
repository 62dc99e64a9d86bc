//! Synthetic and derived input series.

use std::f64::consts::PI;

use chrono::TimeDelta;

use crate::{
    core::series::TimeSeries,
    error::ensure_config,
    prelude::*,
    quantity::{energy::KilowattHours, power::Kilowatts, specific_yield::SpecificYield},
};

const SUNRISE_HOUR: usize = 6;
const SUNSET_HOUR: usize = 18;

/// Series of the same value at every step.
pub fn constant_series<V: Clone>(time_step: TimeDelta, value: V, n_steps: usize) -> TimeSeries<V> {
    TimeSeries::new(time_step, vec![value; n_steps])
}

/// Hourly clear-sky-like specific yield: a half-sine between sunrise and sunset.
///
/// Every day sums up to exactly `daily_yield`.
pub fn synthetic_solar(n_days: usize, daily_yield: SpecificYield) -> TimeSeries<SpecificYield> {
    #[expect(clippy::cast_precision_loss)]
    let shape: Vec<f64> = (0..24)
        .map(|hour| {
            if (SUNRISE_HOUR..SUNSET_HOUR).contains(&hour) {
                let phase = (hour - SUNRISE_HOUR) as f64 + 0.5;
                (PI * phase / (SUNSET_HOUR - SUNRISE_HOUR) as f64).sin()
            } else {
                0.0
            }
        })
        .collect();
    let total: f64 = shape.iter().sum();
    let day: Vec<SpecificYield> = shape.iter().map(|weight| daily_yield * (weight / total)).collect();
    TimeSeries::hourly(day.repeat(n_days))
}

/// Specific yield of a plant scaled from the measured or simulated yield of a reference plant.
///
/// Negative reference samples (night-time consumption of the inverter) are clipped to zero.
pub fn specific_yield_from_reference(
    reference: &TimeSeries<KilowattHours>,
    reference_capacity: Kilowatts,
    post_processing_losses: f64,
) -> Result<TimeSeries<SpecificYield>> {
    ensure_config!(
        reference_capacity.is_finite() && reference_capacity > Kilowatts::ZERO,
        "reference.capacity_kw",
        reference_capacity.0,
        "must be finite and positive",
    );
    ensure_config!(
        (0.0..1.0).contains(&post_processing_losses),
        "reference.post_processing_losses",
        post_processing_losses,
        "must lie within [0, 1)",
    );
    if let Some((index, value)) =
        reference.iter().enumerate().find(|(_, value)| !value.is_finite())
    {
        return Err(Error::configuration(
            format!("reference[{index}]"),
            value.0,
            "must be finite",
        ));
    }
    let specific_yield = reference.clone().map(|energy| {
        energy.max(KilowattHours::ZERO) * (1.0 - post_processing_losses) / reference_capacity
    });
    debug!(
        n_steps = specific_yield.len(),
        total = %specific_yield.sum(),
        "derived the specific yield",
    );
    Ok(specific_yield)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_constant_series() {
        let series = constant_series(TimeDelta::hours(1), KilowattHours::from(10.0), 48);
        assert_eq!(series.len(), 48);
        assert_abs_diff_eq!(series.sum().0, 480.0);
    }

    #[test]
    fn test_synthetic_solar_daily_total() {
        let series = synthetic_solar(3, SpecificYield::from(5.0));
        assert_eq!(series.len(), 72);
        assert_eq!(series.time_step, TimeDelta::hours(1));
        for day in series.values.chunks(24) {
            let total: SpecificYield = day.iter().copied().sum();
            assert_abs_diff_eq!(total.0, 5.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_synthetic_solar_shape() {
        let series = synthetic_solar(1, SpecificYield::from(5.0));
        assert_abs_diff_eq!(series.values[0].0, 0.0);
        assert_abs_diff_eq!(series.values[5].0, 0.0);
        assert_abs_diff_eq!(series.values[18].0, 0.0);
        assert!(series.values[6] > SpecificYield::ZERO);
        assert!(series.values[11] > series.values[7]);
        assert_abs_diff_eq!(series.values[11].0, series.values[12].0, epsilon = 1e-12);
        assert!(series.validate("specific_generation").is_ok());
    }

    #[test]
    fn test_specific_yield_from_reference() {
        let reference = TimeSeries::hourly(
            [-0.2, 0.0, 50.0, 100.0].into_iter().map(KilowattHours::from).collect(),
        );
        let specific_yield =
            specific_yield_from_reference(&reference, Kilowatts::from(100.0), 0.03).unwrap();
        assert_abs_diff_eq!(specific_yield.values[0].0, 0.0);
        assert_abs_diff_eq!(specific_yield.values[2].0, 0.485);
        assert_abs_diff_eq!(specific_yield.values[3].0, 0.97);
    }

    #[test]
    fn test_zero_reference_capacity_is_rejected() {
        let reference = TimeSeries::hourly(vec![KilowattHours::from(1.0)]);
        let error = specific_yield_from_reference(&reference, Kilowatts::ZERO, 0.0).unwrap_err();
        assert!(
            matches!(error, Error::Configuration { ref field, .. } if field == "reference.capacity_kw")
        );
    }

    #[test]
    fn test_full_losses_are_rejected() {
        let reference = TimeSeries::hourly(vec![KilowattHours::from(1.0)]);
        assert!(specific_yield_from_reference(&reference, Kilowatts::from(1.0), 1.0).is_err());
    }
}
