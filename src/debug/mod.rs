//! Debug bundle: per-cell fit details for a handful of cells, as markdown.
//!
//! `DebugBundle` is a `DiagnosticsSink`. Attach it to a tracker, run, then
//! call `write` to dump what it saw: the theta profile on the tropopause, the
//! fit coefficients and derivative, the candidates and the selection.

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;

use crate::domain::Hemisphere;
use crate::error::AppError;
use crate::fit::{FitWarning, JetChoice};
use crate::jet::{CellDiagnostic, DiagnosticsSink};

/// Owned copy of one cell diagnostic.
#[derive(Debug, Clone)]
pub struct DebugEntry {
    pub hemisphere: Hemisphere,
    pub time_value: f64,
    pub column: usize,
    pub lat: Vec<f64>,
    pub profile: Vec<f64>,
    pub shear: Vec<f64>,
    pub fit: Result<DebugFit, String>,
    pub candidates: Vec<usize>,
    pub choice: Option<JetChoice>,
}

#[derive(Debug, Clone)]
pub struct DebugFit {
    pub coef: Vec<f64>,
    pub window: Range<usize>,
    pub rank: usize,
    pub warning: Option<FitWarning>,
    pub derivative: Vec<f64>,
}

#[derive(Debug)]
pub struct DebugBundle {
    columns: Range<usize>,
    max_cells: usize,
    entries: Mutex<Vec<DebugEntry>>,
}

impl DebugBundle {
    pub fn new(columns: Range<usize>, max_cells: usize) -> Self {
        Self {
            columns,
            max_cells,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Longitude columns 10..30 when the grid has them, else all columns.
    pub fn default_columns(n_lon: usize) -> Range<usize> {
        if n_lon > 10 { 10..n_lon.min(30) } else { 0..n_lon }
    }

    /// Entries sorted by hemisphere, column, time.
    pub fn entries(&self) -> Vec<DebugEntry> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        entries.sort_by(|a, b| {
            (a.hemisphere.index(), a.column)
                .cmp(&(b.hemisphere.index(), b.column))
                .then(a.time_value.total_cmp(&b.time_value))
        });
        entries
    }

    /// Write `stj_debug_{stem}_{timestamp}.md` into `dir`.
    pub fn write(&self, dir: &Path, stem: &str) -> Result<PathBuf, AppError> {
        create_dir_all(dir)
            .map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;
        let ts = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("stj_debug_{stem}_{ts}.md"));
        let file = File::create(&path)
            .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;
        let mut out = BufWriter::new(file);
        self.write_markdown(&mut out)
            .and_then(|_| out.flush())
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        Ok(path)
    }

    fn write_markdown<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let entries = self.entries();
        writeln!(out, "# stj debug bundle")?;
        writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
        writeln!(out, "- columns: {}..{}", self.columns.start, self.columns.end)?;
        writeln!(out, "- cells: {}", entries.len())?;

        for e in &entries {
            writeln!(out, "\n## {} t={} column={}", e.hemisphere, e.time_value, e.column)?;
            match &e.fit {
                Ok(fit) => {
                    writeln!(
                        out,
                        "Fit: window={}..{} rank={} coef={}",
                        fit.window.start,
                        fit.window.end,
                        fit.rank,
                        fmt_vec(&fit.coef)
                    )?;
                    if let Some(FitWarning::RankDeficient { valid, rank, terms }) = fit.warning {
                        writeln!(out, "- rank deficient: {valid} valid, rank {rank} of {terms}")?;
                    }
                }
                Err(reason) => writeln!(out, "Fit failed: {reason}")?,
            }
            let candidates: Vec<String> =
                e.candidates.iter().map(|&i| fmt_lat(&e.lat, i)).collect();
            writeln!(out, "Candidates: [{}]", candidates.join(", "))?;
            match e.choice {
                Some(ch) => {
                    writeln!(out, "Selected: {} ({:?})", fmt_lat(&e.lat, ch.index), ch.rule)?
                }
                None => writeln!(out, "Selected: -")?,
            }

            writeln!(out, "\n| lat | theta_trop | shear | dtheta/dlat |")?;
            writeln!(out, "| - | - | - | - |")?;
            for (i, lat) in e.lat.iter().enumerate() {
                let deriv = e.fit.as_ref().ok().and_then(|fit| {
                    fit.window
                        .contains(&i)
                        .then(|| fit.derivative[i - fit.window.start])
                });
                writeln!(
                    out,
                    "| {:.2} | {} | {} | {} |",
                    lat,
                    fmt_opt(e.profile.get(i).copied()),
                    fmt_opt(e.shear.get(i).copied()),
                    fmt_opt(deriv)
                )?;
            }
        }
        Ok(())
    }
}

impl DiagnosticsSink for DebugBundle {
    fn wants(&self, _hemisphere: Hemisphere, _time_index: usize, column: usize) -> bool {
        self.columns.contains(&column)
            && self.entries.lock().is_ok_and(|e| e.len() < self.max_cells)
    }

    fn record(&self, cell: &CellDiagnostic<'_>) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.len() >= self.max_cells {
            return;
        }
        entries.push(DebugEntry {
            hemisphere: cell.hemisphere,
            time_value: cell.time_value,
            column: cell.column,
            lat: cell.lat.to_vec(),
            profile: cell.profile.to_vec(),
            shear: cell.shear.to_vec(),
            fit: cell
                .fit
                .map(|f| DebugFit {
                    coef: f.coef.clone(),
                    window: f.window.clone(),
                    rank: f.rank,
                    warning: f.warning,
                    derivative: f.derivative.clone(),
                })
                .map_err(|e| e.to_string()),
            candidates: cell.candidates.to_vec(),
            choice: cell.choice,
        });
    }
}

fn fmt_vec(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.3}"),
        _ => "-".to_string(),
    }
}

fn fmt_lat(lat: &[f64], index: usize) -> String {
    lat.get(index).map_or_else(|| "?".to_string(), |v| format!("{v:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::{single_break_tropopause, synthetic_field};
    use crate::domain::{JetConfig, LevelKind, ZonalMode};
    use crate::grid::{Grid, TimeAxis};
    use crate::jet::JetTracker;

    #[test]
    fn default_columns_clamp_to_grid() {
        assert_eq!(DebugBundle::default_columns(144), 10..30);
        assert_eq!(DebugBundle::default_columns(16), 10..16);
        assert_eq!(DebugBundle::default_columns(4), 0..4);
    }

    #[test]
    fn bundle_caps_cells_and_writes_markdown() {
        let lat: Vec<f64> = (-36..=36).map(|i| f64::from(i) * 2.5).collect();
        let level: Vec<f64> = (0..32).map(|i| 265.0 + 5.0 * f64::from(i)).collect();
        let grid = Grid::new(
            TimeAxis::new(vec![0.0, 1.0], "days since 2000-01-01", "standard"),
            level,
            LevelKind::Theta,
            lat,
            Some(vec![0.0, 90.0, 180.0, 270.0]),
        )
        .unwrap();
        let field = synthetic_field(
            grid,
            2.0,
            |_, lat, _| single_break_tropopause(lat, 20.0),
            |_, phi, _| 30.0 - (phi.abs() - 20.0).abs() * 0.4,
        )
        .unwrap();

        let bundle = DebugBundle::new(1..3, 5);
        let config = JetConfig {
            zonal_mode: ZonalMode::Longitude,
            ..JetConfig::default()
        };
        let tracker = JetTracker::new(config).unwrap().with_diagnostics(&bundle);
        let record = tracker.run(&field);
        assert_eq!(record.north.n_valid(), 8);

        let entries = bundle.entries();
        assert!(!entries.is_empty() && entries.len() <= 5);
        assert!(entries.iter().all(|e| (1..3).contains(&e.column)));

        let dir = tempfile::tempdir().unwrap();
        let path = bundle.write(dir.path(), "scene").unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("# stj debug bundle"));
        assert!(text.contains("Selected:"));
    }
}
