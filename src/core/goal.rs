use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{core::metrics::Metrics, prelude::*};

/// Scalar figure of the [`Metrics`] a goal is expressed in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Indicator {
    Lcoe,
    BlendedLcoe,
    SelfConsumption,
    SelfSufficiency,
    AnnualCost,
    NetPresentValue,
    InternalRateOfReturn,
    PaybackYears,
}

impl Indicator {
    pub const ALL: [Self; 8] = [
        Self::Lcoe,
        Self::BlendedLcoe,
        Self::SelfConsumption,
        Self::SelfSufficiency,
        Self::AnnualCost,
        Self::NetPresentValue,
        Self::InternalRateOfReturn,
        Self::PaybackYears,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Lcoe => "lcoe",
            Self::BlendedLcoe => "blended-lcoe",
            Self::SelfConsumption => "self-consumption",
            Self::SelfSufficiency => "self-sufficiency",
            Self::AnnualCost => "annual-cost",
            Self::NetPresentValue => "net-present-value",
            Self::InternalRateOfReturn => "internal-rate-of-return",
            Self::PaybackYears => "payback-years",
        }
    }

    /// Fails the evaluation when the indicator is undefined for the metrics.
    pub fn value(self, metrics: &Metrics) -> Result<f64> {
        let value = match self {
            Self::Lcoe => metrics.lcoe.map(|lcoe| lcoe.0),
            Self::BlendedLcoe => metrics.blended_lcoe.map(|lcoe| lcoe.0),
            Self::SelfConsumption => Some(metrics.self_consumption_rate),
            Self::SelfSufficiency => Some(metrics.self_sufficiency_rate),
            Self::AnnualCost => Some(metrics.annual_cost.0),
            Self::NetPresentValue => Some(metrics.net_present_value.0),
            Self::InternalRateOfReturn => metrics.internal_rate_of_return,
            Self::PaybackYears => metrics.payback_years,
        };
        value.ok_or_else(|| Error::Evaluation(format!("{self} is undefined for the design")))
    }
}

impl Display for Indicator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Optimisation objective.
///
/// Written as `minimise-lcoe` and alike, or `seek-<indicator>=<target>` for a target value.
#[derive(Copy, Clone, Debug, PartialEq, SerializeDisplay, DeserializeFromStr)]
pub enum Goal {
    MinimiseLcoe,
    MaximiseSelfConsumption,
    MaximiseSelfSufficiency,
    MinimiseAnnualCost,
    MaximiseNetPresentValue,

    /// Bring the indicator as close to the target as possible.
    Seek { indicator: Indicator, target: f64 },
}

impl Goal {
    /// Goals without a target.
    pub const ALL: [Self; 5] = [
        Self::MinimiseLcoe,
        Self::MaximiseSelfConsumption,
        Self::MaximiseSelfSufficiency,
        Self::MinimiseAnnualCost,
        Self::MaximiseNetPresentValue,
    ];

    /// Reduce the metrics to a scalar, lower is better.
    pub fn score(self, metrics: &Metrics) -> Result<f64> {
        match self {
            Self::MinimiseLcoe => Indicator::Lcoe.value(metrics),
            Self::MaximiseSelfConsumption => Ok(-Indicator::SelfConsumption.value(metrics)?),
            Self::MaximiseSelfSufficiency => Ok(-Indicator::SelfSufficiency.value(metrics)?),
            Self::MinimiseAnnualCost => Indicator::AnnualCost.value(metrics),
            Self::MaximiseNetPresentValue => Ok(-Indicator::NetPresentValue.value(metrics)?),
            Self::Seek { indicator, target } => Ok((indicator.value(metrics)? - target).abs()),
        }
    }
}

impl Display for Goal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MinimiseLcoe => f.write_str("minimise-lcoe"),
            Self::MaximiseSelfConsumption => f.write_str("maximise-self-consumption"),
            Self::MaximiseSelfSufficiency => f.write_str("maximise-self-sufficiency"),
            Self::MinimiseAnnualCost => f.write_str("minimise-annual-cost"),
            Self::MaximiseNetPresentValue => f.write_str("maximise-net-present-value"),
            Self::Seek { indicator, target } => write!(f, "seek-{indicator}={target}"),
        }
    }
}

impl FromStr for Goal {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        let invalid = || Error::InvalidGoal(name.to_string());
        let normalised = name.trim().to_lowercase().replace('_', "-");
        let normalised = normalised.replace("maximize", "maximise").replace("minimize", "minimise");
        if let Some((indicator, target)) =
            normalised.strip_prefix("seek-").and_then(|seek| seek.split_once('='))
        {
            let indicator = Indicator::ALL
                .into_iter()
                .find(|candidate| candidate.name() == indicator.trim())
                .ok_or_else(invalid)?;
            let target: f64 = target.trim().parse().map_err(|_| invalid())?;
            if !target.is_finite() {
                return Err(invalid());
            }
            return Ok(Self::Seek { indicator, target });
        }
        Self::ALL.into_iter().find(|goal| goal.to_string() == normalised).ok_or_else(invalid)
    }
}
