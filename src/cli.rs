use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pv_sizer::{
    core::{DesignParameters, Goal, Parameter},
    quantity::{energy::KilowattHours, power::Kilowatts},
    study::{CostField, Spacing, Sweep},
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Search for the design that best meets the study goal.
    #[clap(name = "optimise", alias = "optimize")]
    Optimise(Box<OptimiseArgs>),

    /// Evaluate the study goal along a single parameter.
    #[clap(name = "sweep")]
    Sweep(Box<SweepArgs>),

    /// Re-run the optimisation for different values of a cost assumption.
    #[clap(name = "sensitivity")]
    Sensitivity(Box<SensitivityArgs>),
}

#[derive(Parser)]
pub struct StudyArgs {
    /// TOML study file.
    #[clap(long = "study", env = "STUDY")]
    pub path: PathBuf,

    /// Override the goal of the study file.
    #[clap(long, env = "GOAL")]
    pub goal: Option<Goal>,

    /// Override the optimiser seed.
    #[clap(long, env = "SEED")]
    pub seed: Option<u64>,

    /// Override the number of worker threads.
    #[clap(long, env = "THREADS")]
    pub threads: Option<usize>,

    /// Write the full result as JSON.
    #[clap(long)]
    pub output: Option<PathBuf>,
}

impl StudyArgs {
    /// Directory to resolve the relative series paths against.
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[derive(Parser)]
pub struct OptimiseArgs {
    #[clap(flatten)]
    pub study: StudyArgs,
}

#[derive(Parser)]
pub struct SweepArgs {
    #[clap(flatten)]
    pub study: StudyArgs,

    /// Swept parameter.
    #[clap(long, value_enum)]
    pub parameter: Parameter,

    #[clap(long)]
    pub min: f64,

    #[clap(long)]
    pub max: f64,

    #[clap(long, default_value = "20")]
    pub steps: usize,

    #[clap(long, value_enum, default_value_t = Spacing::Linear)]
    pub spacing: Spacing,

    /// PV capacity while sweeping the storage.
    #[clap(long = "pv-capacity-kw", default_value = "0")]
    pub pv_capacity: f64,

    /// Storage capacity while sweeping the PV.
    #[clap(long = "storage-capacity-kwh", default_value = "0")]
    pub storage_capacity: f64,
}

impl SweepArgs {
    pub fn sweep(&self) -> Sweep {
        Sweep::builder()
            .parameter(self.parameter)
            .min(self.min)
            .max(self.max)
            .steps(self.steps)
            .spacing(self.spacing)
            .base(
                DesignParameters::builder()
                    .pv_capacity(Kilowatts::from(self.pv_capacity))
                    .storage_capacity(KilowattHours::from(self.storage_capacity))
                    .build(),
            )
            .build()
    }
}

#[derive(Parser)]
pub struct SensitivityArgs {
    #[clap(flatten)]
    pub study: StudyArgs,

    /// Varied cost assumption.
    #[clap(long, value_enum)]
    pub field: CostField,

    /// Comma-separated values of the cost assumption.
    #[clap(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub values: Vec<f64>,
}
