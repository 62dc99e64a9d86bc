use serde::{Deserialize, Serialize};

use crate::{
    core::{
        balance::EnergyBalance,
        cashflow::Cashflow,
        costs::CostAssumptions,
        design::DesignParameters,
    },
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
};

/// Performance and economic figures of a simulated design.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Levelised cost of the delivered energy, [`None`] when no energy is delivered.
    pub lcoe: Option<KilowattHourRate>,

    /// Like [`Metrics::lcoe`] but including the grid import cost and the export revenue.
    pub blended_lcoe: Option<KilowattHourRate>,

    /// Share of the generation consumed on site.
    pub self_consumption_rate: f64,

    /// Share of the load served on site.
    pub self_sufficiency_rate: f64,

    pub capex: Cost,
    pub annual_opex: Cost,

    /// Annualised investment, opex and import cost, net of the export revenue.
    pub annual_cost: Cost,

    /// First-year savings against buying all the load from the grid.
    pub annual_savings: Cost,

    /// Discounted lifetime cash flow, including the investment.
    pub net_present_value: Cost,

    /// [`None`] without an investment, or when the cash flows never break even at any rate.
    pub internal_rate_of_return: Option<f64>,

    /// [`None`] when the plant does not pay back within its lifetime.
    pub payback_years: Option<f64>,

    pub annual_generation: KilowattHours,
    pub annual_load: KilowattHours,
    pub annual_self_consumed: KilowattHours,
    pub annual_import: KilowattHours,
    pub annual_export: KilowattHours,
    pub annual_curtailed: KilowattHours,
}

impl Metrics {
    /// Reduce the simulated representative year and its lifetime projection.
    ///
    /// The annual figures describe the representative year at the base tariffs,
    /// the lifetime figures come from the `cashflow`.
    pub fn compute(
        balance: &EnergyBalance,
        cashflow: &Cashflow,
        parameters: &DesignParameters,
        costs: &CostAssumptions,
    ) -> Self {
        let totals = balance.totals();

        let capex = costs.capex(parameters);
        let annual_opex = costs.annual_opex(parameters);
        let annualised_capex = costs.annualised_capex(parameters);

        let import_cost = totals.import * costs.import_tariff;
        let export_revenue = totals.export * costs.export_tariff;
        let annual_cost = annualised_capex + annual_opex + import_cost - export_revenue;
        let baseline_cost = totals.load * costs.import_tariff;
        let annual_savings = baseline_cost - (import_cost - export_revenue) - annual_opex;

        let delivered = totals.delivered();
        let (lcoe, blended_lcoe) = if delivered > KilowattHours::ZERO {
            (Some((annualised_capex + annual_opex) / delivered), Some(annual_cost / delivered))
        } else {
            (None, None)
        };

        Self {
            lcoe,
            blended_lcoe,
            self_consumption_rate: ratio(totals.self_consumed, totals.generation),
            self_sufficiency_rate: ratio(totals.self_consumed, totals.load),
            capex,
            annual_opex,
            annual_cost,
            annual_savings,
            net_present_value: cashflow.net_present_value(costs.discount_rate),
            internal_rate_of_return: cashflow.internal_rate_of_return(),
            payback_years: cashflow.payback_years(),
            annual_generation: totals.generation,
            annual_load: totals.load,
            annual_self_consumed: totals.self_consumed,
            annual_import: totals.import,
            annual_export: totals.export,
            annual_curtailed: totals.curtailed,
        }
    }
}

/// Share within `[0, 1]`, zero for an empty whole.
fn ratio(part: KilowattHours, whole: KilowattHours) -> f64 {
    if whole > KilowattHours::ZERO { (part / whole).clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::{
        core::{
            series::TimeSeries,
            simulator::{SimulationOptions, simulate},
        },
        quantity::{power::Kilowatts, rate::KilowattRate},
    };

    fn costs() -> CostAssumptions {
        CostAssumptions::builder()
            .pv_capex(KilowattRate::from(1000.0))
            .opex_rate(0.01)
            .discount_rate(0.0)
            .lifetime_years(20.0)
            .import_tariff(KilowattHourRate::from(0.25))
            .export_tariff(KilowattHourRate::from(0.05))
            .build()
    }

    fn pv(capacity: f64) -> DesignParameters {
        DesignParameters::builder().pv_capacity(Kilowatts::from(capacity)).build()
    }

    fn metrics(capacity: f64, load: &[f64], specific_yield: &[f64]) -> Metrics {
        let parameters = pv(capacity);
        let balance = simulate(
            &parameters,
            &TimeSeries::hourly(load.iter().copied().map(KilowattHours::from).collect()),
            &TimeSeries::hourly(specific_yield.iter().copied().map(Into::into).collect()),
            &SimulationOptions::default(),
        )
        .unwrap();
        let costs = costs();
        let cashflow =
            Cashflow::project(&parameters, &costs, &balance.totals(), |_| unreachable!()).unwrap();
        Metrics::compute(&balance, &cashflow, &parameters, &costs)
    }

    #[test]
    fn test_hand_computed_lcoe() {
        // 2 kWp × (0.5 + 0.0) kWh/kWp against 1 kWh per hour:
        let metrics = metrics(2.0, &[1.0, 1.0], &[0.5, 0.0]);

        // Capex 2000, CRF 1/20 → 100 per year, opex 20 per year, 2 kWh delivered:
        assert_abs_diff_eq!(metrics.capex.0, 2000.0);
        assert_abs_diff_eq!(metrics.annual_opex.0, 20.0);
        assert_abs_diff_eq!(metrics.lcoe.unwrap().0, 60.0);

        // Import 1 kWh at 0.25, no export:
        assert_abs_diff_eq!(metrics.annual_cost.0, 120.25);
        assert_abs_diff_eq!(metrics.blended_lcoe.unwrap().0, 60.125);
        assert_abs_diff_eq!(metrics.self_consumption_rate, 1.0);
        assert_abs_diff_eq!(metrics.self_sufficiency_rate, 0.5);
    }

    #[test]
    fn test_savings_and_payback() {
        let metrics = metrics(2.0, &[1.0, 1.0], &[1.0, 0.5]);
        // Baseline 0.5, import 0, export 1 kWh × 0.05, opex 20:
        assert_abs_diff_eq!(metrics.annual_savings.0, 0.5 + 0.05 - 20.0, epsilon = 1e-9);
        assert_eq!(metrics.payback_years, None);
        assert!(metrics.net_present_value < Cost::ZERO);
    }

    #[test]
    fn test_lifetime_figures() {
        let metrics = metrics(2.0, &[1.0, 1.0], &[1.0, 0.5]);
        // Savings are negative every year without discounting over 20 years:
        assert_abs_diff_eq!(
            metrics.net_present_value.0,
            20.0 * metrics.annual_savings.0 - 2000.0,
            epsilon = 1e-6
        );
        assert_eq!(metrics.internal_rate_of_return, None);
    }

    #[test]
    fn test_zero_capacity() {
        let metrics = metrics(0.0, &[1.0, 2.0], &[0.5, 0.5]);
        assert_abs_diff_eq!(metrics.self_consumption_rate, 0.0);
        assert_abs_diff_eq!(metrics.self_sufficiency_rate, 0.0);
        assert_abs_diff_eq!(metrics.annual_import.0, 3.0);
        assert_abs_diff_eq!(metrics.lcoe.unwrap().0, 0.0);
        assert_eq!(metrics.payback_years, Some(0.0));
        assert_abs_diff_eq!(metrics.net_present_value.0, 0.0);
    }

    #[test]
    fn test_zero_load_leaves_lcoe_undefined() {
        let metrics = metrics(3.0, &[0.0, 0.0], &[0.5, 0.5]);
        assert_eq!(metrics.lcoe, None);
        assert_eq!(metrics.blended_lcoe, None);
        assert_abs_diff_eq!(metrics.self_sufficiency_rate, 0.0);
        assert_abs_diff_eq!(metrics.self_consumption_rate, 0.0);
        assert_abs_diff_eq!(metrics.annual_export.0, 3.0);
    }

    proptest! {
        #[test]
        fn prop_rates_are_consistent(
            capacity in 0.0..30.0_f64,
            samples in prop::collection::vec((0.0..20.0_f64, 0.0..1.0_f64), 1..72),
        ) {
            let (load, specific_yield): (Vec<f64>, Vec<f64>) = samples.into_iter().unzip();
            let metrics = metrics(capacity, &load, &specific_yield);
            prop_assert!((0.0..=1.0).contains(&metrics.self_consumption_rate));
            prop_assert!((0.0..=1.0).contains(&metrics.self_sufficiency_rate));
            let lhs = metrics.self_consumption_rate * metrics.annual_generation.0;
            let rhs = metrics.self_sufficiency_rate * metrics.annual_load.0;
            prop_assert!((lhs - rhs).abs() < 1e-6);
        }

        #[test]
        fn prop_self_sufficiency_grows_with_capacity(
            smaller in 0.0..20.0_f64,
            increment in 0.0..20.0_f64,
            samples in prop::collection::vec((0.1..20.0_f64, 0.0..1.0_f64), 1..72),
        ) {
            let (load, specific_yield): (Vec<f64>, Vec<f64>) = samples.into_iter().unzip();
            let small = metrics(smaller, &load, &specific_yield);
            let large = metrics(smaller + increment, &load, &specific_yield);
            prop_assert!(large.self_sufficiency_rate >= small.self_sufficiency_rate - 1e-9);
        }
    }
}
