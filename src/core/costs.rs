use serde::{Deserialize, Serialize};

use crate::{
    core::design::DesignParameters,
    error::ensure_config,
    prelude::*,
    quantity::{
        cost::Cost,
        rate::{KilowattHourRate, KilowattRate},
    },
};

const MAX_LIFETIME_YEARS: f64 = 100.0;

/// Simple cost model, immutable for the whole optimisation run.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
pub struct CostAssumptions {
    /// PV investment per kWp.
    #[serde(rename = "pv_capex_per_kw")]
    pub pv_capex: KilowattRate,

    /// PV development expenses per kWp, added to the investment.
    #[serde(rename = "pv_devex_per_kw", default)]
    #[builder(default)]
    pub pv_devex: KilowattRate,

    /// Storage investment per kWh of capacity.
    #[serde(rename = "storage_capex_per_kwh", default)]
    #[builder(default)]
    pub storage_capex: KilowattHourRate,

    /// Annual operation and maintenance as a fraction of the investment.
    #[builder(default = 0.0)]
    pub opex_rate: f64,

    pub discount_rate: f64,

    pub lifetime_years: f64,

    #[serde(rename = "import_tariff_per_kwh")]
    pub import_tariff: KilowattHourRate,

    #[serde(rename = "export_tariff_per_kwh", default)]
    #[builder(default)]
    pub export_tariff: KilowattHourRate,

    /// Yearly loss of the PV output as a fraction of the nameplate capacity.
    #[serde(default)]
    #[builder(default = 0.0)]
    pub pv_degradation: f64,

    /// Yearly relative increase of the import tariff, starting from the second year.
    #[serde(default)]
    #[builder(default = 0.0)]
    pub import_escalation: f64,

    #[serde(default)]
    #[builder(default = 0.0)]
    pub export_escalation: f64,

    #[serde(default)]
    #[builder(default = 0.0)]
    pub opex_escalation: f64,
}

impl CostAssumptions {
    pub fn validate(&self) -> Result {
        for (field, value) in [
            ("costs.pv_capex_per_kw", self.pv_capex.0),
            ("costs.pv_devex_per_kw", self.pv_devex.0),
            ("costs.storage_capex_per_kwh", self.storage_capex.0),
            ("costs.opex_rate", self.opex_rate),
            ("costs.discount_rate", self.discount_rate),
            ("costs.import_tariff_per_kwh", self.import_tariff.0),
            ("costs.export_tariff_per_kwh", self.export_tariff.0),
        ] {
            ensure_config!(
                value.is_finite() && value >= 0.0,
                field,
                value,
                "must be finite and non-negative",
            );
        }
        ensure_config!(
            self.lifetime_years.is_finite()
                && (1.0..=MAX_LIFETIME_YEARS).contains(&self.lifetime_years),
            "costs.lifetime_years",
            self.lifetime_years,
            format!("must lie within [1, {MAX_LIFETIME_YEARS}] years"),
        );
        ensure_config!(
            (0.0..1.0).contains(&self.pv_degradation),
            "costs.pv_degradation",
            self.pv_degradation,
            "must lie within [0, 1)",
        );
        for (field, value) in [
            ("costs.import_escalation", self.import_escalation),
            ("costs.export_escalation", self.export_escalation),
            ("costs.opex_escalation", self.opex_escalation),
        ] {
            ensure_config!(value.is_finite() && value > -1.0, field, value, "must be finite and above -1");
        }
        Ok(())
    }

    /// Total up-front investment.
    pub fn capex(&self, parameters: &DesignParameters) -> Cost {
        parameters.pv_capacity * (self.pv_capex + self.pv_devex)
            + parameters.storage_capacity * self.storage_capex
    }

    /// Annual operation and maintenance.
    pub fn annual_opex(&self, parameters: &DesignParameters) -> Cost {
        self.capex(parameters) * self.opex_rate
    }

    /// Capital recovery factor: `r(1+r)^n / ((1+r)^n - 1)`, and `1/n` without discounting.
    pub fn capital_recovery_factor(&self) -> f64 {
        let r = self.discount_rate;
        let n = self.lifetime_years;
        if r < 1e-10 {
            1.0 / n
        } else {
            let compound = (1.0 + r).powf(n);
            r * compound / (compound - 1.0)
        }
    }

    /// Investment spread over the lifetime as equal annual payments.
    pub fn annualised_capex(&self, parameters: &DesignParameters) -> Cost {
        self.capex(parameters) * self.capital_recovery_factor()
    }

    /// PV output of the project year relative to the nameplate, degraded linearly to the mid-year.
    #[expect(clippy::cast_precision_loss)]
    pub fn pv_derating(&self, year: usize) -> f64 {
        self.pv_degradation.mul_add(-(year as f64 - 0.5), 1.0).max(0.0)
    }
}
