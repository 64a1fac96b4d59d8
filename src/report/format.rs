//! Formatted terminal output.
//!
//! Formatting lives here so the tracking code stays free of presentation and
//! output changes stay localized.

use crate::config::{METHOD, RunConfig};
use crate::jet::JetRecord;

use super::HemisphereSummary;

/// Format the run summary: settings, coverage, then one block per hemisphere.
pub fn format_run_summary(
    config: &RunConfig,
    record: &JetRecord,
    summary: &[HemisphereSummary],
) -> String {
    let j = &config.jet;
    let mut out = String::new();

    out.push_str(&format!("=== stj - {METHOD} subtropical jet ===\n"));
    out.push_str(&format!("Dataset: {}\n", config.run.short_name));
    out.push_str(&format!("Years: {}..={}\n", config.run.year_s, config.run.year_e));
    out.push_str(&format!(
        "Jet: pv={} PVU | fit={} deg {} | lat=[{:.1}, {:.1}] | zonal={}\n",
        j.pv_value, j.fit_deg, j.basis, j.min_lat, j.max_lat, j.zonal_mode
    ));
    out.push_str(&format!(
        "Record: {} time steps x {} column(s)\n",
        record.time.len(),
        record.n_columns()
    ));

    for s in summary {
        out.push_str(&format!("\n{}:\n", s.hemisphere));
        out.push_str(&format!(
            "  valid={} missing={} median_lat={} range={} median_intensity={}\n",
            s.n_valid,
            s.n_missing,
            fmt_opt(s.median_lat, 2),
            s.lat_range
                .map(|(lo, hi)| format!("[{lo:.2}, {hi:.2}]"))
                .unwrap_or_else(|| "-".to_string()),
            fmt_opt(s.median_intensity, 2),
        ));
        let st = &s.stats;
        out.push_str(&format!(
            "  cells={} no_surface={} fit_failed={} rank_deficient={} no_candidates={} \
             tie_breaks={}\n",
            st.cells,
            st.no_surface,
            st.fit_failed,
            st.rank_deficient,
            st.no_candidates,
            st.tie_breaks
        ));
    }

    out
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ZonalMode;
    use crate::grid::TimeAxis;
    use crate::jet::HemisphereSeries;
    use crate::report::summarize;
    use ndarray::array;

    #[test]
    fn summary_lists_both_hemispheres() {
        let mut north = HemisphereSeries::missing(2, 1);
        north.lat = array![[27.5], [30.0]];
        north.intensity = array![[25.0], [35.0]];
        let record = JetRecord {
            time: TimeAxis::new(vec![0.0, 1.0], "days since 2000-01-01", "standard"),
            lon: None,
            zonal_mode: ZonalMode::Mean,
            south: HemisphereSeries::missing(2, 1),
            north,
        };
        let config: RunConfig = toml::from_str("").unwrap();
        let text = format_run_summary(&config, &record, &summarize(&record));

        assert!(text.starts_with("=== stj - STJPV subtropical jet ==="));
        assert!(text.contains("Record: 2 time steps x 1 column(s)"));
        assert!(text.contains("SH:\n  valid=0 missing=2 median_lat=-"));
        assert!(text.contains("NH:\n  valid=2 missing=0 median_lat=28.75 range=[27.50, 30.00]"));
    }
}
