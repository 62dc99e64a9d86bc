use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use chrono::TimeDelta;
use pv_sizer::{
    core::{Bounds, CostAssumptions, Goal, SimulationOptions, TimeSeries},
    error::Error,
    optimiser::OptimiserConfig,
    profile::{constant_series, specific_yield_from_reference, synthetic_solar},
    quantity::{energy::KilowattHours, power::Kilowatts, specific_yield::SpecificYield},
    study::Study,
};
use serde::Deserialize;

const fn default_time_step_seconds() -> i64 {
    3600
}

fn time_step(seconds: i64, name: &str) -> Result<TimeDelta> {
    TimeDelta::try_seconds(seconds).ok_or_else(|| {
        Error::configuration(
            format!("{name}.time_step_seconds"),
            seconds,
            "must be within the representable time range",
        )
        .into()
    })
}

/// Where the samples of a series come from.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum SeriesSource {
    /// JSON file with a plain array of numbers.
    File {
        path: PathBuf,

        #[serde(default = "default_time_step_seconds")]
        time_step_seconds: i64,
    },

    Constant {
        value: f64,
        steps: usize,

        #[serde(default = "default_time_step_seconds")]
        time_step_seconds: i64,
    },

    /// Hourly half-sine daylight curve.
    SyntheticSolar { days: usize, daily_yield: f64 },

    /// Specific yield derived from the hourly yield of a reference plant stored as a JSON array.
    Reference {
        path: PathBuf,
        capacity_kw: f64,

        #[serde(default)]
        post_processing_losses: f64,

        #[serde(default = "default_time_step_seconds")]
        time_step_seconds: i64,
    },
}

impl SeriesSource {
    /// Load the samples, resolving relative paths against `base_dir`.
    fn load(&self, base_dir: &Path, name: &str) -> Result<TimeSeries<f64>> {
        match self {
            Self::File { path, time_step_seconds } => {
                let values = read_json_array(&base_dir.join(path))?;
                Ok(TimeSeries::new(time_step(*time_step_seconds, name)?, values))
            }
            Self::Constant { value, steps, time_step_seconds } => {
                Ok(constant_series(time_step(*time_step_seconds, name)?, *value, *steps))
            }
            Self::SyntheticSolar { days, daily_yield } => {
                Ok(synthetic_solar(*days, SpecificYield::from(*daily_yield)).map(|value| value.0))
            }
            Self::Reference { path, capacity_kw, post_processing_losses, time_step_seconds } => {
                if name != "specific_generation" {
                    bail!("`{name}` cannot be derived from a reference plant");
                }
                let reference = TimeSeries::new(
                    time_step(*time_step_seconds, name)?,
                    read_json_array(&base_dir.join(path))?
                        .into_iter()
                        .map(KilowattHours::from)
                        .collect(),
                );
                let specific_yield = specific_yield_from_reference(
                    &reference,
                    Kilowatts::from(*capacity_kw),
                    *post_processing_losses,
                )?;
                Ok(specific_yield.map(|value| value.0))
            }
        }
    }
}

fn read_json_array(path: &Path) -> Result<Vec<f64>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("`{}` is not a JSON array of numbers", path.display()))
}

/// TOML study file.
#[derive(Clone, Debug, Deserialize)]
pub struct StudyFile {
    pub goal: String,
    pub costs: CostAssumptions,
    pub bounds: Bounds,

    #[serde(default)]
    pub simulation: SimulationOptions,

    #[serde(default)]
    pub optimiser: OptimiserConfig,

    pub load: SeriesSource,
    pub specific_generation: SeriesSource,
}

impl StudyFile {
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read the study file `{}`", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse the study file `{}`", path.display()))
    }

    /// Load the series and validate the study.
    pub fn into_study(
        self,
        base_dir: &Path,
        goal: Option<Goal>,
    ) -> Result<(Study, OptimiserConfig)> {
        let goal = match goal {
            Some(goal) => goal,
            None => self.goal.parse()?,
        };
        let load = self
            .load
            .load(base_dir, "load")
            .context("failed to load the load series")?
            .map(KilowattHours::from);
        let specific_generation = self
            .specific_generation
            .load(base_dir, "specific_generation")
            .context("failed to load the specific generation series")?
            .map(SpecificYield::from);
        let study = Study::builder()
            .load(load)
            .specific_generation(specific_generation)
            .costs(self.costs)
            .goal(goal)
            .bounds(self.bounds)
            .options(self.simulation)
            .try_build()?;
        Ok((study, self.optimiser))
    }
}
