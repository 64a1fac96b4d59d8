//! Shared domain types.
//!
//! This module defines:
//!
//! - configuration enums (`Basis`, `ZonalMode`, `LevelKind`)
//! - the hemisphere partition of the latitude axis (`Hemisphere`)
//! - the core algorithm settings (`JetConfig`)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::JetError;

/// Basis family used to fit theta-on-tropopause as a function of latitude.
///
/// All three span the same polynomial space, so an exact solver returns the
/// same curve for each; they differ in conditioning and in the coefficients
/// reported to diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Basis {
    Chebyshev,
    Legendre,
    Power,
}

impl Basis {
    pub fn display_name(self) -> &'static str {
        match self {
            Basis::Chebyshev => "chebyshev",
            Basis::Legendre => "legendre",
            Basis::Power => "power",
        }
    }
}

impl FromStr for Basis {
    type Err = JetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cheby" | "cby" | "cheb" | "chebyshev" => Ok(Basis::Chebyshev),
            "leg" | "legen" | "legendre" => Ok(Basis::Legendre),
            "poly" | "polynomial" | "power" => Ok(Basis::Power),
            _ => Err(JetError::InvalidConfig {
                field: "poly",
                value: s.to_string(),
                reason: "expected chebyshev, legendre or power",
            }),
        }
    }
}

impl TryFrom<String> for Basis {
    type Error = JetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Basis> for String {
    fn from(value: Basis) -> Self {
        value.display_name().to_string()
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Whether output is kept per longitude or reduced to a zonal median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ZonalMode {
    /// One jet position per time step: median over longitudes.
    Mean,
    /// One jet position per (time, longitude).
    Longitude,
}

impl ZonalMode {
    pub fn display_name(self) -> &'static str {
        match self {
            ZonalMode::Mean => "mean",
            ZonalMode::Longitude => "longitude",
        }
    }
}

impl FromStr for ZonalMode {
    type Err = JetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" | "zonal" | "zonal-mean" | "zonal_mean" => Ok(ZonalMode::Mean),
            "lon" | "longitude" | "none" | "all" => Ok(ZonalMode::Longitude),
            _ => Err(JetError::InvalidConfig {
                field: "zonal_opt",
                value: s.to_string(),
                reason: "expected mean or longitude",
            }),
        }
    }
}

impl TryFrom<String> for ZonalMode {
    type Error = JetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ZonalMode> for String {
    fn from(value: ZonalMode) -> Self {
        value.display_name().to_string()
    }
}

impl fmt::Display for ZonalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Physical meaning of the vertical coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    /// Potential temperature (K); theta increases upward.
    #[serde(alias = "th")]
    Theta,
    /// Pressure (hPa); pressure decreases upward.
    #[serde(alias = "pres")]
    Pressure,
}

impl LevelKind {
    /// True when `first -> last` runs from the surface upward.
    pub fn is_upward(self, first: f64, last: f64) -> bool {
        match self {
            LevelKind::Theta => first < last,
            LevelKind::Pressure => first > last,
        }
    }
}

/// One half of the latitude axis. The jet search runs once per hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    South,
    North,
}

impl Hemisphere {
    pub const ALL: [Hemisphere; 2] = [Hemisphere::South, Hemisphere::North];

    /// Position in per-hemisphere output arrays (south first).
    pub fn index(self) -> usize {
        match self {
            Hemisphere::South => 0,
            Hemisphere::North => 1,
        }
    }

    /// Suffix used in output short names (`lat_sh`, `lat_nh`, ...).
    pub fn short_suffix(self) -> &'static str {
        match self {
            Hemisphere::South => "sh",
            Hemisphere::North => "nh",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Hemisphere::South => "SH",
            Hemisphere::North => "NH",
        }
    }

    /// Membership of a latitude: south is `lat < 0`, north is `lat >= 0`.
    pub fn contains(self, lat: f64) -> bool {
        match self {
            Hemisphere::South => lat < 0.0,
            Hemisphere::North => lat >= 0.0,
        }
    }

    /// PV threshold with the hemisphere's sign (negative in the south).
    pub fn signed_threshold(self, pv_value: f64) -> f64 {
        match self {
            Hemisphere::South => -pv_value.abs(),
            Hemisphere::North => pv_value.abs(),
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Settings for the dynamical-tropopause jet search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JetConfig {
    /// Magnitude of the PV contour that defines the tropopause (PVU).
    #[serde(default = "default_pv_value")]
    pub pv_value: f64,
    /// Degree of the basis expansion fitted to theta on the tropopause.
    #[serde(default = "default_fit_deg")]
    pub fit_deg: usize,
    /// Equatorward limit of the fit window (degrees).
    #[serde(default = "default_min_lat")]
    pub min_lat: f64,
    /// Poleward limit recorded with the output (degrees).
    #[serde(default = "default_max_lat")]
    pub max_lat: f64,
    #[serde(default = "default_basis", rename = "poly")]
    pub basis: Basis,
    #[serde(default = "default_zonal_mode", rename = "zonal_opt")]
    pub zonal_mode: ZonalMode,
}

fn default_pv_value() -> f64 {
    2.0
}
fn default_fit_deg() -> usize {
    6
}
fn default_min_lat() -> f64 {
    10.0
}
fn default_max_lat() -> f64 {
    65.0
}
fn default_basis() -> Basis {
    Basis::Chebyshev
}
fn default_zonal_mode() -> ZonalMode {
    ZonalMode::Mean
}

impl Default for JetConfig {
    fn default() -> Self {
        Self {
            pv_value: default_pv_value(),
            fit_deg: default_fit_deg(),
            min_lat: default_min_lat(),
            max_lat: default_max_lat(),
            basis: default_basis(),
            zonal_mode: default_zonal_mode(),
        }
    }
}

impl JetConfig {
    /// Reject settings that would make every cell meaningless.
    pub fn validate(&self) -> Result<(), JetError> {
        if !(self.pv_value.is_finite() && self.pv_value != 0.0) {
            return Err(JetError::InvalidConfig {
                field: "pv_value",
                value: self.pv_value.to_string(),
                reason: "must be finite and non-zero",
            });
        }
        if self.fit_deg < 1 {
            return Err(JetError::InvalidConfig {
                field: "fit_deg",
                value: self.fit_deg.to_string(),
                reason: "must be >= 1",
            });
        }
        if !(self.min_lat.is_finite() && (0.0..90.0).contains(&self.min_lat)) {
            return Err(JetError::InvalidConfig {
                field: "min_lat",
                value: self.min_lat.to_string(),
                reason: "must lie in [0, 90)",
            });
        }
        if !(self.max_lat.is_finite() && self.max_lat > self.min_lat && self.max_lat <= 90.0) {
            return Err(JetError::InvalidConfig {
                field: "max_lat",
                value: self.max_lat.to_string(),
                reason: "must lie in (min_lat, 90]",
            });
        }
        Ok(())
    }
}
