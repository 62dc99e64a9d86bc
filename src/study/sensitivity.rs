use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{
    core::costs::CostAssumptions,
    optimiser::{Cancellation, OptimiserConfig},
    prelude::*,
    quantity::Quantity,
    study::{OptimisationResult, Study},
};

/// Cost assumption varied by the sensitivity analysis.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CostField {
    PvCapex,
    PvDevex,
    StorageCapex,
    OpexRate,
    DiscountRate,
    Lifetime,
    ImportTariff,
    ExportTariff,
    PvDegradation,
    ImportEscalation,
    ExportEscalation,
    OpexEscalation,
}

impl CostField {
    pub const fn name(self) -> &'static str {
        match self {
            Self::PvCapex => "pv-capex",
            Self::PvDevex => "pv-devex",
            Self::StorageCapex => "storage-capex",
            Self::OpexRate => "opex-rate",
            Self::DiscountRate => "discount-rate",
            Self::Lifetime => "lifetime",
            Self::ImportTariff => "import-tariff",
            Self::ExportTariff => "export-tariff",
            Self::PvDegradation => "pv-degradation",
            Self::ImportEscalation => "import-escalation",
            Self::ExportEscalation => "export-escalation",
            Self::OpexEscalation => "opex-escalation",
        }
    }

    /// Replace the field value, leaving the rest of the assumptions intact.
    pub const fn apply(self, mut costs: CostAssumptions, value: f64) -> CostAssumptions {
        match self {
            Self::PvCapex => costs.pv_capex = Quantity(value),
            Self::PvDevex => costs.pv_devex = Quantity(value),
            Self::StorageCapex => costs.storage_capex = Quantity(value),
            Self::OpexRate => costs.opex_rate = value,
            Self::DiscountRate => costs.discount_rate = value,
            Self::Lifetime => costs.lifetime_years = value,
            Self::ImportTariff => costs.import_tariff = Quantity(value),
            Self::ExportTariff => costs.export_tariff = Quantity(value),
            Self::PvDegradation => costs.pv_degradation = value,
            Self::ImportEscalation => costs.import_escalation = value,
            Self::ExportEscalation => costs.export_escalation = value,
            Self::OpexEscalation => costs.opex_escalation = value,
        }
        costs
    }
}

impl Display for CostField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub value: f64,
    pub result: OptimisationResult,
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub field: CostField,
    pub points: Vec<SensitivityPoint>,

    /// The run was cancelled before all the values were processed.
    pub cancelled: bool,
}

impl Study {
    /// Re-run the optimisation for each value of the cost assumption.
    ///
    /// All the modified assumption sets are validated before the first run.
    #[instrument(
        skip_all,
        name = "Sensitivity analysis…",
        fields(field = %field, n_values = values.len()),
    )]
    pub fn sensitivity(
        &self,
        field: CostField,
        values: &[f64],
        config: &OptimiserConfig,
        cancellation: &Cancellation,
    ) -> Result<SensitivityReport> {
        let studies = values
            .iter()
            .map(|value| {
                let study = self.clone().with_costs(field.apply(self.costs, *value))?;
                Ok((*value, study))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut points = Vec::with_capacity(studies.len());
        for (value, study) in studies {
            if cancellation.is_cancelled() {
                warn!(n_processed = points.len(), "cancelled");
                return Ok(SensitivityReport { field, points, cancelled: true });
            }
            let result = study.optimise(config, cancellation)?;
            info!(value, parameters = %result.parameters, score = result.score, "processed");
            points.push(SensitivityPoint { value, result });
        }
        Ok(SensitivityReport { field, points, cancelled: false })
    }
}
