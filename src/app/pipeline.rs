//! Shared run pipeline used by the `run`, `sens` and `sample` commands.
//!
//! dataset -> year selection -> per-year tracking -> merge -> JSON/CSV outputs
//!
//! The commands then only differ in how they build the config and what they
//! print.

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::RunConfig;
use crate::domain::ZonalMode;
use crate::error::AppError;
use crate::grid::GriddedField;
use crate::io::{read_dataset, write_record_csv, write_record_json};
use crate::jet::{DiagnosticsSink, JetRecord, JetTracker};
use crate::report::{HemisphereSummary, summarize};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub record: JetRecord,
    pub summary: Vec<HemisphereSummary>,
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
}

/// Read the dataset named by the config.
pub fn load_field(config: &RunConfig) -> Result<GriddedField, AppError> {
    let path = config
        .data
        .input
        .as_deref()
        .ok_or_else(|| AppError::new(2, "No input dataset: set data.input or pass --input."))?;
    read_dataset(path)
}

/// Track the jet over the configured years.
///
/// With `chunk_by_year` the selection is split into calendar years, each year
/// is tracked on its own and the records are merged in order.
pub fn find_jets(
    field: &GriddedField,
    config: &RunConfig,
    sink: Option<&dyn DiagnosticsSink>,
) -> Result<JetRecord, AppError> {
    let mut tracker = JetTracker::new(config.jet.clone())?;
    if let Some(sink) = sink {
        tracker = tracker.with_diagnostics(sink);
    }

    let selected = field
        .grid()
        .time
        .select_years(config.run.year_s, config.run.year_e)?;
    let field = field.slice_time(selected);

    let chunks = if config.run.chunk_by_year {
        field.grid().time.year_chunks()?
    } else {
        vec![0..field.grid().time.len()]
    };

    let lon = match config.jet.zonal_mode {
        ZonalMode::Longitude => field.grid().lon.clone(),
        ZonalMode::Mean => None,
    };
    let mut record = JetRecord::empty(
        field.grid().time.units.clone(),
        field.grid().time.calendar.clone(),
        config.jet.zonal_mode,
        lon,
    );
    let n_chunks = chunks.len();
    for (i, range) in chunks.into_iter().enumerate() {
        let chunk = field.slice_time(range);
        info!(chunk = i + 1, of = n_chunks, steps = chunk.grid().time.len(), "tracking chunk");
        record = record.merge(tracker.run(&chunk))?;
    }
    Ok(record)
}

/// Write `{stem}.json` and `{stem}.csv` into `dir`.
pub fn write_outputs(
    record: &JetRecord,
    config: &RunConfig,
    dir: &Path,
) -> Result<(PathBuf, PathBuf), AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::new(4, format!("Failed to create output dir '{}': {e}", dir.display()))
    })?;
    let stem = config.output_stem();
    let json_path = dir.join(format!("{stem}.json"));
    let csv_path = dir.join(format!("{stem}.csv"));
    write_record_json(&json_path, record, &config.jet)?;
    write_record_csv(&csv_path, record)?;
    info!(json = %json_path.display(), csv = %csv_path.display(), "wrote outputs");
    Ok((json_path, csv_path))
}

/// Track, summarize and write outputs for an already loaded field.
pub fn run_with_field(
    field: &GriddedField,
    config: &RunConfig,
    sink: Option<&dyn DiagnosticsSink>,
) -> Result<RunOutput, AppError> {
    let record = find_jets(field, config, sink)?;
    let summary = summarize(&record);
    let (json_path, csv_path) = write_outputs(&record, config, &config.run.output)?;
    Ok(RunOutput {
        record,
        summary,
        json_path,
        csv_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::{SampleOptions, sample_field};
    use crate::io::read_record_json;

    fn config(dir: &Path) -> RunConfig {
        let mut config: RunConfig = toml::from_str("").unwrap();
        config.run.short_name = "sample".to_string();
        config.run.year_s = 1979;
        config.run.year_e = 1980;
        config.run.output = dir.to_path_buf();
        config
    }

    #[test]
    fn chunked_and_whole_runs_agree() {
        let field = sample_field(&SampleOptions {
            n_times: 24,
            n_lons: 4,
            ..SampleOptions::default()
        })
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());

        let chunked = find_jets(&field, &config, None).unwrap();
        config.run.chunk_by_year = false;
        let whole = find_jets(&field, &config, None).unwrap();

        assert_eq!(chunked.time.len(), 24);
        let same = |a: &f64, b: &f64| a == b || (a.is_nan() && b.is_nan());
        assert!(chunked.north.lat.iter().zip(whole.north.lat.iter()).all(|(a, b)| same(a, b)));
        assert_eq!(chunked.south.stats, whole.south.stats);
    }

    #[test]
    fn year_selection_trims_the_record() {
        let field = sample_field(&SampleOptions {
            n_times: 36,
            n_lons: 2,
            ..SampleOptions::default()
        })
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.run.year_s = 1980;
        config.run.year_e = 1980;
        config.jet.zonal_mode = ZonalMode::Longitude;

        let record = find_jets(&field, &config, None).unwrap();
        assert_eq!(record.time.len(), 12);
        assert_eq!(record.n_columns(), 2);
    }

    #[test]
    fn outputs_are_named_by_stem_and_read_back() {
        let field = sample_field(&SampleOptions {
            n_times: 12,
            n_lons: 2,
            ..SampleOptions::default()
        })
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.run.year_e = 1979;

        let out = run_with_field(&field, &config, None).unwrap();
        assert!(out.json_path.ends_with(format!("{}.json", config.output_stem())));
        assert!(out.csv_path.exists());
        let back = read_record_json(&out.json_path).unwrap();
        assert_eq!(back.time, out.record.time);
        assert_eq!(out.summary.len(), 2);
    }

    #[test]
    fn missing_input_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_field(&config(dir.path())).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
