//! Export jet series to CSV.
//!
//! Long format, one row per (time, hemisphere, column), so the file loads
//! directly into spreadsheets or dataframe tools. Missing samples are empty
//! fields; `lon` is empty for zonal-median records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::Hemisphere;
use crate::error::AppError;
use crate::jet::JetRecord;

/// Write the jet series of `record` to a CSV file.
pub fn write_record_csv(path: &Path, record: &JetRecord) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;
    write_csv(BufWriter::new(file), record)
}

fn write_csv<W: Write>(mut out: W, record: &JetRecord) -> Result<(), AppError> {
    writeln!(out, "time,hemisphere,lon,jet_latitude,jet_theta,jet_intensity")
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV header: {e}")))?;

    for (t, time) in record.time.values.iter().enumerate() {
        for hemisphere in Hemisphere::ALL {
            let series = record.hemisphere(hemisphere);
            for col in 0..record.n_columns() {
                let lon = record
                    .lon
                    .as_ref()
                    .map(|lon| format!("{}", lon[col]))
                    .unwrap_or_default();
                writeln!(
                    out,
                    "{},{},{},{},{},{}",
                    time,
                    hemisphere.short_suffix(),
                    lon,
                    cell(series.lat[[t, col]], 4),
                    cell(series.theta[[t, col]], 3),
                    cell(series.intensity[[t, col]], 3),
                )
                .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
            }
        }
    }
    out.flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))
}

fn cell(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ZonalMode;
    use crate::grid::TimeAxis;
    use crate::jet::HemisphereSeries;
    use ndarray::array;

    #[test]
    fn rows_cover_every_hemisphere_and_column() {
        let mut north = HemisphereSeries::missing(1, 2);
        north.lat = array![[27.5, f64::NAN]];
        north.theta = array![[351.25, f64::NAN]];
        north.intensity = array![[30.0, f64::NAN]];
        let record = JetRecord {
            time: TimeAxis::new(vec![15.0], "days since 1979-01-01", "standard"),
            lon: Some(vec![0.0, 180.0]),
            zonal_mode: ZonalMode::Longitude,
            south: HemisphereSeries::missing(1, 2),
            north,
        };

        let mut buf = Vec::new();
        write_csv(&mut buf, &record).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "time,hemisphere,lon,jet_latitude,jet_theta,jet_intensity");
        assert_eq!(lines[1], "15,sh,0,,,");
        assert_eq!(lines[3], "15,nh,0,27.5000,351.250,30.000");
        assert_eq!(lines[4], "15,nh,180,,,");
    }
}
