//! TOML run configuration.
//!
//! ```toml
//! [run]
//! short_name = "erai"
//! year_s = 1979
//! year_e = 2015
//! log_file = "stj_find_{}.log"
//! output = "out"
//!
//! [jet]
//! pv_value = 2.0
//! fit_deg = 6
//! poly = "cheby"
//! zonal_opt = "mean"
//!
//! [data]
//! input = "data/erai_theta.json"
//! ```
//!
//! Every section and key is optional except `data.input`, which may also come
//! from the command line.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::JetConfig;
use crate::error::{AppError, JetError};

/// Method tag used in output names.
pub const METHOD: &str = "STJPV";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub jet: JetConfig,
    #[serde(default)]
    pub data: DataSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Dataset label at the start of output names.
    #[serde(default = "default_short_name")]
    pub short_name: String,
    #[serde(default = "default_year_s")]
    pub year_s: i32,
    #[serde(default = "default_year_e")]
    pub year_e: i32,
    /// Log file; a `{}` is replaced by the start time.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Output directory.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Split the run into calendar years and merge the results.
    #[serde(default = "default_true")]
    pub chunk_by_year: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            short_name: default_short_name(),
            year_s: default_year_s(),
            year_e: default_year_e(),
            log_file: None,
            output: default_output(),
            chunk_by_year: true,
        }
    }
}

fn default_short_name() -> String {
    "stj".to_string()
}
fn default_year_s() -> i32 {
    1979
}
fn default_year_e() -> i32 {
    2015
}
fn default_output() -> PathBuf {
    PathBuf::from("out")
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSection {
    /// JSON dataset file.
    #[serde(default)]
    pub input: Option<PathBuf>,
}

impl RunConfig {
    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(2, format!("Failed to read config '{}': {e}", path.display()))
        })?;
        let config: RunConfig = toml::from_str(&text).map_err(|e| {
            AppError::new(2, format!("Invalid config '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), JetError> {
        self.jet.validate()?;
        if self.run.year_s > self.run.year_e {
            return Err(JetError::InvalidConfig {
                field: "year_e",
                value: self.run.year_e.to_string(),
                reason: "must not precede year_s",
            });
        }
        if self.run.short_name.trim().is_empty() {
            return Err(JetError::InvalidConfig {
                field: "short_name",
                value: self.run.short_name.clone(),
                reason: "must not be empty",
            });
        }
        Ok(())
    }

    /// `{short_name}_STJPV_pv{pv}_fit{deg}_y0{min}_yN{max}_z{zonal}_{start}_{end}`.
    pub fn output_stem(&self) -> String {
        let j = &self.jet;
        format!(
            "{}_{METHOD}_pv{:?}_fit{}_y0{:?}_yN{:?}_z{}_{}-01-01_{}-12-31",
            self.run.short_name,
            j.pv_value,
            j.fit_deg,
            j.min_lat,
            j.max_lat,
            j.zonal_mode,
            self.run.year_s,
            self.run.year_e
        )
    }

    /// Log file path with the `{}` placeholder filled by `stamp`.
    pub fn log_path(&self, stamp: &str) -> Option<PathBuf> {
        self.run
            .log_file
            .as_ref()
            .map(|name| PathBuf::from(name.replace("{}", stamp)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Basis, ZonalMode};

    #[test]
    fn minimal_config_uses_defaults() {
        let config: RunConfig = toml::from_str("[data]\ninput = \"scene.json\"\n").unwrap();
        assert_eq!(config.jet, JetConfig::default());
        assert_eq!(config.run.year_s, 1979);
        assert_eq!(config.data.input, Some(PathBuf::from("scene.json")));
    }

    #[test]
    fn aliases_parse_in_jet_section() {
        let text = r#"
            [run]
            short_name = "erai"
            year_s = 1980
            year_e = 1981

            [jet]
            pv_value = 2.5
            fit_deg = 8
            poly = "LEG"
            zonal_opt = "lon"
        "#;
        let config: RunConfig = toml::from_str(text).unwrap();
        assert_eq!(config.jet.basis, Basis::Legendre);
        assert_eq!(config.jet.zonal_mode, ZonalMode::Longitude);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = toml::from_str::<RunConfig>("[jet]\nfit_degree = 6\n");
        assert!(err.is_err());
        let err = toml::from_str::<RunConfig>("[jet]\npoly = \"spline\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn inverted_years_are_invalid() {
        let mut config: RunConfig = toml::from_str("").unwrap();
        config.run.year_s = 2000;
        config.run.year_e = 1999;
        assert!(matches!(
            config.validate(),
            Err(JetError::InvalidConfig { field: "year_e", .. })
        ));
    }

    #[test]
    fn output_stem_matches_naming_scheme() {
        let mut config: RunConfig = toml::from_str("").unwrap();
        config.run.short_name = "erai".to_string();
        config.run.year_s = 1979;
        config.run.year_e = 1980;
        assert_eq!(
            config.output_stem(),
            "erai_STJPV_pv2.0_fit6_y010.0_yN65.0_zmean_1979-01-01_1980-12-31"
        );
    }

    #[test]
    fn log_placeholder_is_filled() {
        let mut config: RunConfig = toml::from_str("").unwrap();
        config.run.log_file = Some("stj_find_{}.log".to_string());
        assert_eq!(
            config.log_path("2024-01-02_03-04-05"),
            Some(PathBuf::from("stj_find_2024-01-02_03-04-05.log"))
        );
    }
}
