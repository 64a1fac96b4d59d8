//! CF-style time coordinate.
//!
//! Time is kept as numeric offsets plus the `units` and `calendar` strings so it
//! can be written back unchanged. Decoding is only needed to split a run into
//! calendar years and to select a range of years.

use std::ops::Range;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::JetError;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Supported CF calendars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    /// Proleptic Gregorian (`standard`, `gregorian`, `proleptic_gregorian`).
    Standard,
    /// 365-day years (`noleap`, `365_day`).
    NoLeap,
    /// 366-day years (`all_leap`, `366_day`).
    AllLeap,
    /// Twelve 30-day months (`360_day`).
    Day360,
}

impl FromStr for Calendar {
    type Err = JetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "standard" | "gregorian" | "proleptic_gregorian" => Ok(Calendar::Standard),
            "noleap" | "365_day" => Ok(Calendar::NoLeap),
            "all_leap" | "366_day" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            _ => Err(JetError::InvalidCalendar {
                calendar: s.to_string(),
            }),
        }
    }
}

impl Calendar {
    fn days_per_year(self) -> Option<f64> {
        match self {
            Calendar::Standard => None,
            Calendar::NoLeap => Some(365.0),
            Calendar::AllLeap => Some(366.0),
            Calendar::Day360 => Some(360.0),
        }
    }

    /// Zero-based day of year of `date` in this (fixed-length) calendar.
    fn day_of_year(self, date: NaiveDateTime) -> f64 {
        const NOLEAP: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        const ALL_LEAP: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        let month = date.month0() as usize;
        let before: u32 = match self {
            Calendar::Day360 => 30 * month as u32,
            Calendar::AllLeap => ALL_LEAP[..month].iter().sum(),
            _ => NOLEAP[..month].iter().sum(),
        };
        let seconds = date.num_seconds_from_midnight() as f64;
        (before + date.day0()) as f64 + seconds / SECONDS_PER_DAY
    }
}

/// Parsed `"<unit> since <reference>"` string.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TimeUnits {
    seconds_per_unit: f64,
    epoch: NaiveDateTime,
}

impl FromStr for TimeUnits {
    type Err = JetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || JetError::InvalidTimeUnits {
            units: s.to_string(),
        };
        let (unit, reference) = s.split_once(" since ").ok_or_else(invalid)?;
        let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "s" => 1.0,
            "minutes" | "minute" | "mins" => 60.0,
            "hours" | "hour" | "hrs" | "h" => 3_600.0,
            "days" | "day" | "d" => SECONDS_PER_DAY,
            _ => return Err(invalid()),
        };
        let epoch = parse_reference(reference.trim()).ok_or_else(invalid)?;
        Ok(TimeUnits {
            seconds_per_unit,
            epoch,
        })
    }
}

fn parse_reference(text: &str) -> Option<NaiveDateTime> {
    // Drop a trailing UTC marker ("Z", "UTC", "+00:00") if present.
    let text = text
        .trim_end_matches(" UTC")
        .trim_end_matches('Z')
        .trim_end_matches("+00:00")
        .trim();
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Time coordinate of a grid or a jet record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    pub values: Vec<f64>,
    pub units: String,
    #[serde(default = "default_calendar")]
    pub calendar: String,
}

fn default_calendar() -> String {
    "standard".to_string()
}

impl TimeAxis {
    pub fn new(values: Vec<f64>, units: impl Into<String>, calendar: impl Into<String>) -> Self {
        Self {
            values,
            units: units.into(),
            calendar: calendar.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Non-empty, finite, strictly increasing, decodable.
    pub fn validate(&self) -> Result<(), JetError> {
        if self.values.is_empty() {
            return Err(JetError::InvalidCoordinate {
                axis: "time",
                reason: "no time steps".to_string(),
            });
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err(JetError::InvalidCoordinate {
                axis: "time",
                reason: "non-finite time value".to_string(),
            });
        }
        if self.values.windows(2).any(|w| w[1] <= w[0]) {
            return Err(JetError::InvalidCoordinate {
                axis: "time",
                reason: "values must be strictly increasing".to_string(),
            });
        }
        self.units.parse::<TimeUnits>()?;
        self.calendar.parse::<Calendar>()?;
        Ok(())
    }

    /// Calendar year of every time step.
    pub fn years(&self) -> Result<Vec<i32>, JetError> {
        let units: TimeUnits = self.units.parse()?;
        let calendar: Calendar = self.calendar.parse()?;
        Ok(self
            .values
            .iter()
            .map(|&v| decode_year(v, units, calendar))
            .collect())
    }

    /// Contiguous index ranges, one per calendar year, in order.
    pub fn year_chunks(&self) -> Result<Vec<Range<usize>>, JetError> {
        let years = self.years()?;
        let mut chunks = Vec::new();
        let mut start = 0;
        for i in 1..=years.len() {
            if i == years.len() || years[i] != years[start] {
                chunks.push(start..i);
                start = i;
            }
        }
        Ok(chunks)
    }

    /// Index range of the steps whose year lies in `[year_s, year_e]`.
    pub fn select_years(&self, year_s: i32, year_e: i32) -> Result<Range<usize>, JetError> {
        let years = self.years()?;
        let start = years.iter().position(|&y| y >= year_s);
        let end = years.iter().rposition(|&y| y <= year_e).map(|i| i + 1);
        match (start, end) {
            (Some(s), Some(e)) if s < e => Ok(s..e),
            _ => Err(JetError::EmptySelection { year_s, year_e }),
        }
    }

    pub fn slice(&self, range: Range<usize>) -> TimeAxis {
        TimeAxis {
            values: self.values[range].to_vec(),
            units: self.units.clone(),
            calendar: self.calendar.clone(),
        }
    }
}

fn decode_year(value: f64, units: TimeUnits, calendar: Calendar) -> i32 {
    let seconds = value * units.seconds_per_unit;
    match calendar.days_per_year() {
        None => {
            let offset = Duration::milliseconds((seconds * 1_000.0).round() as i64);
            units
                .epoch
                .checked_add_signed(offset)
                .map(|dt| dt.year())
                .unwrap_or(units.epoch.year())
        }
        Some(days_per_year) => {
            let days = calendar.day_of_year(units.epoch) + seconds / SECONDS_PER_DAY;
            units.epoch.year() + (days / days_per_year).floor() as i32
        }
    }
}
