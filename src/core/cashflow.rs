use serde::{Deserialize, Serialize};

use crate::{
    core::{balance::Totals, costs::CostAssumptions, design::DesignParameters},
    prelude::*,
    quantity::cost::Cost,
};

/// Lowest rate the internal rate of return is searched from.
const MIN_RATE: f64 = -0.99;

/// Highest rate the internal rate of return is searched up to.
const MAX_RATE: f64 = 100.0;

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CashflowYear {
    /// Project year, starting from 1.
    pub year: usize,

    /// Covered share of the year, only the last year of a fractional lifetime is partial.
    pub weight: f64,

    /// PV output relative to the nameplate capacity.
    pub pv_derating: f64,

    pub import_cost: Cost,
    pub export_revenue: Cost,
    pub opex: Cost,

    /// Savings against buying all the load from the grid, net of the opex.
    pub net: Cost,
}

/// Undiscounted yearly cash flows of the project, the investment is spent at year 0.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cashflow {
    pub investment: Cost,
    pub years: Vec<CashflowYear>,
}

impl Cashflow {
    /// Project the cash flows over the lifetime.
    ///
    /// Tariffs and opex escalate from the second year. When the PV degrades,
    /// `totals_at` is asked for the annual totals at the year's derating factor,
    /// otherwise every year repeats the `nominal` totals.
    pub fn project(
        parameters: &DesignParameters,
        costs: &CostAssumptions,
        nominal: &Totals,
        mut totals_at: impl FnMut(f64) -> Result<Totals>,
    ) -> Result<Self> {
        let opex = costs.annual_opex(parameters);

        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n_years = costs.lifetime_years.ceil() as usize;

        let years = (1..=n_years)
            .map(|year| {
                let pv_derating = costs.pv_derating(year);
                let totals =
                    if costs.pv_degradation > 0.0 { totals_at(pv_derating)? } else { *nominal };

                #[expect(clippy::cast_precision_loss)]
                let (elapsed, weight) =
                    ((year - 1) as f64, (costs.lifetime_years - (year - 1) as f64).min(1.0));
                let import_tariff = costs.import_tariff * (1.0 + costs.import_escalation).powf(elapsed);
                let export_tariff = costs.export_tariff * (1.0 + costs.export_escalation).powf(elapsed);

                let import_cost = totals.import * import_tariff * weight;
                let export_revenue = totals.export * export_tariff * weight;
                let opex = opex * (1.0 + costs.opex_escalation).powf(elapsed) * weight;
                let baseline_cost = totals.load * import_tariff * weight;
                Ok(CashflowYear {
                    year,
                    weight,
                    pv_derating,
                    import_cost,
                    export_revenue,
                    opex,
                    net: baseline_cost - import_cost + export_revenue - opex,
                })
            })
            .collect::<Result<_>>()?;

        Ok(Self { investment: costs.capex(parameters), years })
    }

    /// Discounted sum of the cash flows, including the investment.
    pub fn net_present_value(&self, discount_rate: f64) -> Cost {
        let factor = 1.0 / (1.0 + discount_rate);
        let (_, discounted) = self.years.iter().fold(
            (1.0, -self.investment),
            |(discount, total), year| {
                let discount = discount * factor;
                (discount, total + year.net * discount)
            },
        );
        discounted
    }

    /// Discount rate at which the net present value is zero.
    ///
    /// [`None`] when the cash flows never change sign, or the root is out of the search range.
    pub fn internal_rate_of_return(&self) -> Option<f64> {
        let (mut low, mut high) = (MIN_RATE, MAX_RATE);
        let (npv_low, npv_high) = (self.net_present_value(low).0, self.net_present_value(high).0);
        if !npv_low.is_finite() || !npv_high.is_finite() || (npv_low > 0.0) == (npv_high > 0.0) {
            return None;
        }
        for _ in 0..200 {
            let middle = 0.5 * (low + high);
            if high - low < 1e-12 {
                return Some(middle);
            }
            if (self.net_present_value(middle).0 > 0.0) == (npv_low > 0.0) {
                low = middle;
            } else {
                high = middle;
            }
        }
        Some(0.5 * (low + high))
    }

    /// Time until the cumulative cash balance turns non-negative, interpolated within the year.
    ///
    /// [`None`] when the project does not pay back within its lifetime.
    pub fn payback_years(&self) -> Option<f64> {
        if self.investment <= Cost::ZERO {
            return Some(0.0);
        }
        let mut balance = -self.investment;
        let mut elapsed = 0.0;
        for year in &self.years {
            if year.net > Cost::ZERO && balance + year.net >= Cost::ZERO {
                return Some(elapsed + (-balance / year.net) * year.weight);
            }
            balance += year.net;
            elapsed += year.weight;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::quantity::{
        energy::KilowattHours,
        power::Kilowatts,
        rate::{KilowattHourRate, KilowattRate},
    };

    fn costs() -> CostAssumptions {
        CostAssumptions::builder()
            .pv_capex(KilowattRate::from(1000.0))
            .discount_rate(0.05)
            .lifetime_years(10.0)
            .import_tariff(KilowattHourRate::from(0.25))
            .export_tariff(KilowattHourRate::from(0.05))
            .build()
    }

    fn pv(capacity: f64) -> DesignParameters {
        DesignParameters::builder().pv_capacity(Kilowatts::from(capacity)).build()
    }

    /// 4000 kWh load, 2000 kWh of it self-consumed, 1000 kWh exported.
    fn totals() -> Totals {
        Totals {
            load: KilowattHours::from(4000.0),
            generation: KilowattHours::from(3000.0),
            self_consumed: KilowattHours::from(2000.0),
            import: KilowattHours::from(2000.0),
            export: KilowattHours::from(1000.0),
            ..Totals::default()
        }
    }

    fn project(costs: &CostAssumptions) -> Cashflow {
        Cashflow::project(&pv(3.0), costs, &totals(), |_| panic!("no degradation expected")).unwrap()
    }

    #[test]
    fn test_flat_cashflow() {
        // Savings: 2000 × 0.25 + 1000 × 0.05 = 550 per year against 3000 invested:
        let cashflow = project(&costs());
        assert_eq!(cashflow.years.len(), 10);
        assert_abs_diff_eq!(cashflow.investment.0, 3000.0);
        for year in &cashflow.years {
            assert_abs_diff_eq!(year.net.0, 550.0, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(cashflow.payback_years().unwrap(), 3000.0 / 550.0, epsilon = 1e-9);
    }

    #[test]
    fn test_flat_npv_matches_annuity() {
        let costs = costs();
        let cashflow = project(&costs);
        let expected = 550.0 / costs.capital_recovery_factor() - 3000.0;
        assert_abs_diff_eq!(cashflow.net_present_value(0.05).0, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_internal_rate_of_return_zeroes_npv() {
        let cashflow = project(&costs());
        let irr = cashflow.internal_rate_of_return().unwrap();
        assert!(irr > 0.05);
        assert_abs_diff_eq!(cashflow.net_present_value(irr).0, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_without_investment_there_is_no_rate_of_return() {
        let cashflow =
            Cashflow::project(&pv(0.0), &costs(), &totals(), |_| unreachable!()).unwrap();
        assert_eq!(cashflow.internal_rate_of_return(), None);
        assert_eq!(cashflow.payback_years(), Some(0.0));
    }

    #[test]
    fn test_no_payback_within_lifetime() {
        let costs = CostAssumptions { pv_capex: KilowattRate::from(5000.0), ..costs() };
        let cashflow = project(&costs);
        assert_eq!(cashflow.payback_years(), None);
        assert!(cashflow.internal_rate_of_return().unwrap() < 0.0);
    }

    #[test]
    fn test_import_escalation() {
        let costs = CostAssumptions { import_escalation: 0.1, ..costs() };
        let cashflow = project(&costs);
        // Year 1 uses the base tariff, year 2 the escalated one:
        assert_abs_diff_eq!(cashflow.years[0].import_cost.0, 500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cashflow.years[1].import_cost.0, 550.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cashflow.years[1].net.0, 4000.0 * 0.275 - 550.0 + 50.0, epsilon = 1e-9);
        assert!(cashflow.net_present_value(0.05) > project(&self::costs()).net_present_value(0.05));
    }

    #[test]
    fn test_opex_escalation() {
        let costs = CostAssumptions { opex_rate: 0.01, opex_escalation: 0.5, ..costs() };
        let cashflow = project(&costs);
        assert_abs_diff_eq!(cashflow.years[0].opex.0, 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cashflow.years[2].opex.0, 67.5, epsilon = 1e-9);
    }

    #[test]
    fn test_degradation_asks_for_derated_totals() {
        let costs = CostAssumptions { pv_degradation: 0.01, ..costs() };
        let mut deratings = Vec::new();
        let cashflow = Cashflow::project(&pv(3.0), &costs, &totals(), |derating| {
            deratings.push(derating);
            Ok(totals())
        })
        .unwrap();
        assert_eq!(deratings.len(), 10);
        assert_abs_diff_eq!(deratings[0], 0.995, epsilon = 1e-12);
        assert_abs_diff_eq!(deratings[9], 0.905, epsilon = 1e-12);
        assert_abs_diff_eq!(cashflow.years[9].pv_derating, 0.905, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_last_year() {
        let costs = CostAssumptions { lifetime_years: 2.5, ..costs() };
        let cashflow = project(&costs);
        assert_eq!(cashflow.years.len(), 3);
        assert_abs_diff_eq!(cashflow.years[2].weight, 0.5);
        assert_abs_diff_eq!(cashflow.years[2].net.0, 275.0, epsilon = 1e-9);
        assert_eq!(cashflow.payback_years(), None);
    }

    #[test]
    fn test_failed_derating_fails_the_projection() {
        let costs = CostAssumptions { pv_degradation: 0.01, ..costs() };
        let result = Cashflow::project(&pv(3.0), &costs, &totals(), |_| {
            Err(Error::Evaluation("simulation failed".into()))
        });
        assert!(result.is_err());
    }
}
