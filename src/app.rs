//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the run configuration and starts logging
//! - runs the jet finder (once, over a sweep, or on a synthetic dataset)
//! - prints the run summary and where outputs went

use std::fs::create_dir_all;
use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use tracing::info;

use crate::cli::{Command, RunArgs, SampleArgs, SensArgs, SensParam};
use crate::config::{DataSection, RunConfig, RunSection};
use crate::data::sample::{SampleOptions, sample_field};
use crate::debug::DebugBundle;
use crate::domain::JetConfig;
use crate::error::AppError;
use crate::io::write_dataset;
use crate::jet::DiagnosticsSink;

pub mod pipeline;

/// Cells kept by the debug bundle.
const DEBUG_CELLS: usize = 30;

/// Entry point for the `stj` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine; RUST_LOG may come from the shell instead.
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args, cli.verbose),
        Command::Sample(args) => handle_sample(args, cli.verbose),
        Command::Sens(args) => handle_sens(args, cli.verbose),
    }
}

fn init_logging(verbose: u8, config: &RunConfig) -> Result<(), AppError> {
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    crate::logging::init(verbose, config.log_path(&stamp).as_deref())
}

fn handle_run(args: RunArgs, verbose: u8) -> Result<(), AppError> {
    let mut config = RunConfig::load(&args.config)?;
    if let Some(input) = args.input {
        config.data.input = Some(input);
    }
    if let Some(output) = args.output {
        config.run.output = output;
    }
    init_logging(verbose, &config)?;

    let field = pipeline::load_field(&config)?;
    let bundle = args
        .debug
        .then(|| DebugBundle::new(DebugBundle::default_columns(field.grid().n_lon()), DEBUG_CELLS));
    let sink = bundle.as_ref().map(|b| b as &dyn DiagnosticsSink);

    let out = pipeline::run_with_field(&field, &config, sink)?;
    println!(
        "{}",
        crate::report::format_run_summary(&config, &out.record, &out.summary)
    );
    println!("Wrote {}", out.json_path.display());
    println!("Wrote {}", out.csv_path.display());

    if let Some(bundle) = &bundle {
        let path = bundle.write(&config.run.output.join("debug"), &config.output_stem())?;
        println!("Debug bundle: {}", path.display());
    }
    Ok(())
}

fn handle_sens(args: SensArgs, verbose: u8) -> Result<(), AppError> {
    let mut config = RunConfig::load(&args.config)?;
    if let Some(input) = args.input {
        config.data.input = Some(input);
    }
    init_logging(verbose, &config)?;
    let field = pipeline::load_field(&config)?;

    for &value in &args.values {
        // Each run works on its own copy, so the loaded setting is untouched.
        let mut swept = config.clone();
        apply_param(&mut swept.jet, args.param, value)?;
        swept.validate()?;
        info!(param = args.param.name(), value, "sensitivity run");

        let out = pipeline::run_with_field(&field, &swept, None)?;
        let medians: Vec<String> = out
            .summary
            .iter()
            .map(|s| {
                let median = s
                    .median_lat
                    .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
                format!("{}={median}", s.hemisphere)
            })
            .collect();
        println!(
            "{}={value}: {} -> {}",
            args.param.name(),
            medians.join(" "),
            out.json_path.display()
        );
    }
    Ok(())
}

/// Set one swept jet setting.
pub fn apply_param(jet: &mut JetConfig, param: SensParam, value: f64) -> Result<(), AppError> {
    match param {
        SensParam::FitDeg => {
            if value.fract() != 0.0 || value < 1.0 {
                return Err(AppError::new(
                    2,
                    format!("fit_deg must be a positive integer, got {value}"),
                ));
            }
            jet.fit_deg = value as usize;
        }
        SensParam::PvValue => jet.pv_value = value,
        SensParam::MinLat => jet.min_lat = value,
        SensParam::MaxLat => jet.max_lat = value,
    }
    Ok(())
}

fn handle_sample(args: SampleArgs, verbose: u8) -> Result<(), AppError> {
    crate::logging::init(verbose, None)?;

    let opts = SampleOptions {
        n_times: args.times,
        n_lons: args.lons,
        seed: args.seed,
        break_lat: args.break_lat,
        ..SampleOptions::default()
    };
    let field = sample_field(&opts)?;

    create_dir_all(&args.output).map_err(|e| {
        AppError::new(4, format!("Failed to create output dir '{}': {e}", args.output.display()))
    })?;
    let path = args.output.join(format!("stj_sample_seed{}.json", opts.seed));
    write_dataset(&path, &field)?;
    println!("Wrote {}", path.display());

    if args.run {
        let config = sample_run_config(&opts, path, args.output);
        let out = pipeline::run_with_field(&field, &config, None)?;
        println!(
            "{}",
            crate::report::format_run_summary(&config, &out.record, &out.summary)
        );
        println!("Wrote {}", out.json_path.display());
    }
    Ok(())
}

/// Run configuration covering every year of a sample dataset.
fn sample_run_config(opts: &SampleOptions, input: PathBuf, output: PathBuf) -> RunConfig {
    let years = (opts.n_times.saturating_sub(1) / 12) as i32;
    RunConfig {
        run: RunSection {
            short_name: "sample".to_string(),
            year_s: opts.start_year,
            year_e: opts.start_year + years,
            output,
            ..RunSection::default()
        },
        jet: JetConfig::default(),
        data: DataSection { input: Some(input) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_deg_must_be_integral() {
        let mut jet = JetConfig::default();
        assert!(apply_param(&mut jet, SensParam::FitDeg, 8.0).is_ok());
        assert_eq!(jet.fit_deg, 8);
        assert_eq!(apply_param(&mut jet, SensParam::FitDeg, 6.5).unwrap_err().exit_code(), 2);
        assert_eq!(jet.fit_deg, 8);
    }

    #[test]
    fn sweep_sets_the_named_field_only() {
        let mut jet = JetConfig::default();
        apply_param(&mut jet, SensParam::MinLat, 15.0).unwrap();
        apply_param(&mut jet, SensParam::PvValue, 3.0).unwrap();
        assert_eq!(jet.min_lat, 15.0);
        assert_eq!(jet.pv_value, 3.0);
        assert_eq!(jet.max_lat, JetConfig::default().max_lat);
    }

    #[test]
    fn sample_config_spans_all_sample_years() {
        let opts = SampleOptions {
            n_times: 30,
            ..SampleOptions::default()
        };
        let config = sample_run_config(&opts, PathBuf::from("s.json"), PathBuf::from("out"));
        assert_eq!(config.run.year_s, 1979);
        assert_eq!(config.run.year_e, 1981);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sample_dataset_runs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let opts = SampleOptions {
            n_times: 12,
            n_lons: 2,
            seed: 7,
            ..SampleOptions::default()
        };
        let path = dir.path().join("scene.json");
        write_dataset(&path, &sample_field(&opts).unwrap()).unwrap();

        let config = sample_run_config(&opts, path, dir.path().to_path_buf());
        let field = pipeline::load_field(&config).unwrap();
        let out = pipeline::run_with_field(&field, &config, None).unwrap();
        assert_eq!(out.record.time.len(), 12);
        assert!(out.csv_path.starts_with(dir.path()));
    }
}
