#![doc = include_str!("../README.md")]

mod cli;
mod config;
mod tables;

use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::{Parser, crate_version};
use pv_sizer::{
    optimiser::{Cancellation, OptimiserConfig},
    study::Study,
};
use serde::Serialize;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::{info, warn};

use crate::{
    cli::{Args, Command, StudyArgs},
    config::StudyFile,
    tables::{
        build_diagnostics_table,
        build_metrics_table,
        build_result_table,
        build_sensitivity_table,
        build_sweep_table,
    },
};

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();

    let cancellation = Cancellation::new();
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, cancellation.flag())
            .context("failed to register the signal handler")?;
    }

    match args.command {
        Command::Optimise(args) => {
            let (study, config) = load_study(&args.study)?;
            let result = study.optimise(&config, &cancellation)?;
            println!("{}", build_result_table(&result));
            println!("{}", build_metrics_table(&result.metrics));
            println!("{}", build_diagnostics_table(&result.diagnostics));
            write_output(args.study.output.as_deref(), &result)?;
        }
        Command::Sweep(args) => {
            let (study, config) = load_study(&args.study)?;
            let report = study.sweep(&args.sweep(), config.threads, &cancellation)?;
            println!("{}", build_sweep_table(&report));
            match report.best_point() {
                Some(best) => info!(parameters = %best.parameters, score = best.score, "best point"),
                None => warn!(n_failed = report.n_failed, "no sweep point could be evaluated"),
            }
            write_output(args.study.output.as_deref(), &report)?;
        }
        Command::Sensitivity(args) => {
            let (study, config) = load_study(&args.study)?;
            let report = study.sensitivity(args.field, &args.values, &config, &cancellation)?;
            println!("{}", build_sensitivity_table(&report));
            write_output(args.study.output.as_deref(), &report)?;
        }
    }

    if cancellation.is_cancelled() {
        warn!("cancelled, the results are partial");
    }
    info!("done!");
    Ok(())
}

/// Read the study file and apply the command-line overrides.
fn load_study(args: &StudyArgs) -> Result<(Study, OptimiserConfig)> {
    let (study, mut config) = StudyFile::read(&args.path)?.into_study(args.base_dir(), args.goal)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    info!(
        path = %args.path.display(),
        goal = %study.goal(),
        n_dimensions = study.bounds().n_dimensions(),
        seed = config.seed,
        "loaded the study",
    );
    Ok((study, config))
}

fn write_output(path: Option<&Path>, value: &impl Serialize) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(value).context("failed to serialize the output")?;
    fs::write(path, json).with_context(|| format!("failed to write `{}`", path.display()))?;
    info!(path = %path.display(), "written");
    Ok(())
}
