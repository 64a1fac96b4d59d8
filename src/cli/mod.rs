//! Command-line parsing for the `stj` jet finder.
//!
//! Argument parsing and command dispatch stay separate from the tracking code;
//! `app` turns these structs into a `RunConfig` and calls the pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "stj",
    version,
    about = "Subtropical jet latitude from the 2 PVU dynamical tropopause"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find the jet in a dataset and write JSON/CSV series.
    Run(RunArgs),
    /// Write a synthetic dataset and optionally run on it.
    Sample(SampleArgs),
    /// Re-run with one jet setting swept over several values.
    Sens(SensArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// TOML run configuration.
    #[arg(long, value_name = "TOML")]
    pub config: PathBuf,

    /// Dataset JSON (overrides `data.input`).
    #[arg(long, value_name = "JSON")]
    pub input: Option<PathBuf>,

    /// Output directory (overrides `run.output`).
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Write a markdown debug bundle for a few cells.
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Monthly time steps.
    #[arg(long, default_value_t = 24)]
    pub times: usize,

    /// Longitudes.
    #[arg(long, default_value_t = 8)]
    pub lons: usize,

    /// Random seed for the break latitude noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Mean tropopause break latitude (degrees).
    #[arg(long, default_value_t = 27.5)]
    pub break_lat: f64,

    /// Output directory.
    #[arg(long, value_name = "DIR", default_value = "out")]
    pub output: PathBuf,

    /// Also run the jet finder on the written dataset.
    #[arg(long)]
    pub run: bool,
}

/// Jet settings that can be swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum SensParam {
    FitDeg,
    PvValue,
    MinLat,
    MaxLat,
}

impl SensParam {
    pub fn name(self) -> &'static str {
        match self {
            SensParam::FitDeg => "fit_deg",
            SensParam::PvValue => "pv_value",
            SensParam::MinLat => "min_lat",
            SensParam::MaxLat => "max_lat",
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct SensArgs {
    /// TOML run configuration.
    #[arg(long, value_name = "TOML")]
    pub config: PathBuf,

    /// Setting to sweep.
    #[arg(long, value_enum)]
    pub param: SensParam,

    /// Comma-separated values.
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub values: Vec<f64>,

    /// Dataset JSON (overrides `data.input`).
    #[arg(long, value_name = "JSON")]
    pub input: Option<PathBuf>,
}
