//! Read/write jet record JSON files.
//!
//! The record JSON is the portable form of a run's output:
//! - the jet settings that produced it
//! - time coordinate (values, units, calendar) and longitudes if kept
//! - one entry per (quantity, hemisphere) with name, short name, units and a
//!   `(time, column)` matrix where `null` marks a missing sample
//! - per-hemisphere cell statistics

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::METHOD;
use crate::domain::{Hemisphere, JetConfig, ZonalMode};
use crate::error::AppError;
use crate::grid::TimeAxis;
use crate::jet::{CellStats, HemisphereSeries, JetRecord, SeriesKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFile {
    pub method: String,
    pub config: JetConfig,
    pub time: TimeAxis,
    pub lon: Option<Vec<f64>>,
    pub zonal_mode: ZonalMode,
    pub series: Vec<SeriesEntry>,
    pub stats: StatsEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub name: String,
    pub short_name: String,
    pub units: String,
    pub hemisphere: Hemisphere,
    /// `(time, column)`, `null` = missing.
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsEntry {
    pub south: CellStats,
    pub north: CellStats,
}

impl RecordFile {
    pub fn from_record(record: &JetRecord, config: &JetConfig) -> Self {
        let mut series = Vec::with_capacity(6);
        for hemisphere in Hemisphere::ALL {
            let h = record.hemisphere(hemisphere);
            for kind in SeriesKind::ALL {
                series.push(SeriesEntry {
                    name: kind.name().to_string(),
                    short_name: kind.short_name(hemisphere),
                    units: kind.units().to_string(),
                    hemisphere,
                    values: h
                        .get(kind)
                        .rows()
                        .into_iter()
                        .map(|row| row.iter().map(|v| v.is_finite().then_some(*v)).collect())
                        .collect(),
                });
            }
        }
        Self {
            method: METHOD.to_string(),
            config: config.clone(),
            time: record.time.clone(),
            lon: record.lon.clone(),
            zonal_mode: record.zonal_mode,
            series,
            stats: StatsEntry {
                south: record.south.stats,
                north: record.north.stats,
            },
        }
    }

    /// Rebuild the in-memory record.
    pub fn to_record(&self) -> Result<JetRecord, AppError> {
        let n_time = self.time.len();
        let n_col = self.lon.as_ref().map_or(1, Vec::len);
        let mut south = HemisphereSeries::missing(n_time, n_col);
        let mut north = HemisphereSeries::missing(n_time, n_col);
        south.stats = self.stats.south;
        north.stats = self.stats.north;

        for entry in &self.series {
            let kind = SeriesKind::ALL
                .into_iter()
                .find(|k| k.name() == entry.name)
                .ok_or_else(|| AppError::new(3, format!("Unknown series '{}'", entry.name)))?;
            let flat: Vec<f64> = entry
                .values
                .iter()
                .flatten()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            let array = Array2::from_shape_vec((n_time, n_col), flat).map_err(|e| {
                AppError::new(3, format!("Series '{}' has the wrong shape: {e}", entry.short_name))
            })?;
            let target = match entry.hemisphere {
                Hemisphere::South => &mut south,
                Hemisphere::North => &mut north,
            };
            match kind {
                SeriesKind::Latitude => target.lat = array,
                SeriesKind::Theta => target.theta = array,
                SeriesKind::Intensity => target.intensity = array,
            }
        }

        Ok(JetRecord {
            time: self.time.clone(),
            lon: self.lon.clone(),
            zonal_mode: self.zonal_mode,
            south,
            north,
        })
    }
}

/// Write a record JSON file.
pub fn write_record_json(
    path: &Path,
    record: &JetRecord,
    config: &JetConfig,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(4, format!("Failed to create record JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), &RecordFile::from_record(record, config))
        .map_err(|e| AppError::new(4, format!("Failed to write record JSON: {e}")))?;
    Ok(())
}

/// Read a record JSON file.
pub fn read_record_json(path: &Path) -> Result<JetRecord, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(3, format!("Failed to open record JSON '{}': {e}", path.display()))
    })?;
    let parsed: RecordFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(3, format!("Invalid record JSON: {e}")))?;
    parsed.to_record()
}
