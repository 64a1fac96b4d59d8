//! JSON dataset reader.
//!
//! A dataset file carries coordinates plus flattened 4-D fields:
//!
//! ```json
//! {
//!   "time":  { "values": [0, 30], "units": "days since 1979-01-01", "calendar": "360_day" },
//!   "level": { "kind": "theta", "values": [300, 310, 320] },
//!   "lat":   [-10, 0, 10],
//!   "lon":   [0, 180],
//!   "dims":  ["time", "level", "lat", "lon"],
//!   "pv":    [0.1, null, ...],
//!   "uwnd":  [3.2, ...]
//! }
//! ```
//!
//! - fields are row-major in `dims` order; `null` marks a missing value
//! - without `dims`, a `shape` must be given and the axis order is inferred
//!   from the coordinate lengths
//! - pressure-level files need `theta`, or `air_temperature` to derive it
//! - `lon` may be omitted for zonally averaged data (length-1 lon axis)

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndarray::Array4;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::LevelKind;
use crate::error::{AppError, JetError};
use crate::grid::{AxisOrder, Dim, Grid, GriddedField, TimeAxis, potential_temperature};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetFile {
    pub time: TimeAxis,
    pub level: LevelCoord,
    pub lat: Vec<f64>,
    #[serde(default)]
    pub lon: Option<Vec<f64>>,
    #[serde(default)]
    pub dims: Option<Vec<Dim>>,
    #[serde(default)]
    pub shape: Option<Vec<usize>>,
    pub pv: Vec<Option<f64>>,
    pub uwnd: Vec<Option<f64>>,
    #[serde(default)]
    pub theta: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub air_temperature: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelCoord {
    pub kind: LevelKind,
    pub values: Vec<f64>,
}

/// Read a dataset file and build the field.
pub fn read_dataset(path: &Path) -> Result<GriddedField, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(3, format!("Failed to open dataset '{}': {e}", path.display()))
    })?;
    let dataset: DatasetFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(3, format!("Invalid dataset '{}': {e}", path.display())))?;
    let field = dataset.into_field()?;
    let shape = field.grid().shape();
    info!(
        path = %path.display(),
        times = shape[0],
        levels = shape[1],
        lats = shape[2],
        lons = shape[3],
        "loaded dataset"
    );
    Ok(field)
}

impl DatasetFile {
    pub fn into_field(self) -> Result<GriddedField, JetError> {
        let grid = Grid::new(
            self.time,
            self.level.values,
            self.level.kind,
            self.lat,
            self.lon,
        )?;
        let lengths = grid.shape();

        let order = match (&self.dims, &self.shape) {
            (Some(dims), _) => AxisOrder::from_tags(dims)?,
            (None, Some(shape)) => AxisOrder::infer(shape, lengths)?,
            (None, None) => AxisOrder::CANONICAL,
        };
        let raw_shape: Vec<usize> = order
            .dims()
            .iter()
            .map(|d| lengths[AxisOrder::CANONICAL.position(*d)])
            .collect();
        let perm = order.to_canonical();

        let pv = to_canonical("pv", self.pv, &raw_shape, perm)?;
        let uwnd = to_canonical("uwnd", self.uwnd, &raw_shape, perm)?;
        let theta = match (self.theta, self.air_temperature) {
            (Some(theta), _) => Some(to_canonical("theta", theta, &raw_shape, perm)?),
            (None, Some(temp)) if grid.level_kind == LevelKind::Pressure => {
                let temp = to_canonical("air_temperature", temp, &raw_shape, perm)?;
                Some(potential_temperature(temp.view(), &grid.level))
            }
            _ => None,
        };

        GriddedField::new(grid, AxisOrder::CANONICAL, pv, uwnd, theta)
    }
}

fn to_canonical(
    name: &'static str,
    values: Vec<Option<f64>>,
    raw_shape: &[usize],
    perm: [usize; 4],
) -> Result<Array4<f64>, JetError> {
    let expected: usize = raw_shape.iter().product();
    if values.len() != expected {
        return Err(JetError::ShapeMismatch {
            field: name,
            actual: vec![values.len()],
            expected: raw_shape.to_vec(),
        });
    }
    let flat: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    let array = Array4::from_shape_vec(
        (raw_shape[0], raw_shape[1], raw_shape[2], raw_shape[3]),
        flat,
    )
    .map_err(|_| JetError::ShapeMismatch {
        field: name,
        actual: raw_shape.to_vec(),
        expected: raw_shape.to_vec(),
    })?;
    Ok(array.permuted_axes(perm).as_standard_layout().into_owned())
}

impl DatasetFile {
    /// Dataset file from a field, canonical order.
    pub fn from_field(field: &GriddedField) -> Self {
        let grid = field.grid();
        let opt = |v: &f64| v.is_finite().then_some(*v);
        Self {
            time: grid.time.clone(),
            level: LevelCoord {
                kind: grid.level_kind,
                values: grid.level.clone(),
            },
            lat: grid.lat.clone(),
            lon: grid.lon.clone(),
            dims: Some(AxisOrder::CANONICAL.dims().to_vec()),
            shape: None,
            pv: field.pv().iter().map(opt).collect(),
            uwnd: field.uwnd().iter().map(opt).collect(),
            theta: field.theta().map(|th| th.iter().map(opt).collect()),
            air_temperature: None,
        }
    }
}

/// Write a field as a dataset file.
pub fn write_dataset(path: &Path, field: &GriddedField) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(4, format!("Failed to create dataset '{}': {e}", path.display()))
    })?;
    serde_json::to_writer(file, &DatasetFile::from_field(field))
        .map_err(|e| AppError::new(4, format!("Failed to write dataset: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn base_json(dims: &str) -> String {
        // 1 time, 2 levels, 3 lats, 2 lons; values encode (t, k, j, i) in `dims` order.
        format!(
            r#"{{
                "time": {{
                    "values": [0],
                    "units": "days since 2000-01-01",
                    "calendar": "standard"
                }},
                "level": {{ "kind": "theta", "values": [300, 320] }},
                "lat": [-20, 0, 20],
                "lon": [0, 180],
                {dims}
                "pv": {pv},
                "uwnd": {pv}
            }}"#,
            pv = "[1,2,3,4,5,6,7,8,9,10,11,null]"
        )
    }

    #[test]
    fn canonical_file_round_trips_values() {
        let dims = r#""dims": ["time", "level", "lat", "lon"],"#;
        let ds: DatasetFile = serde_json::from_str(&base_json(dims)).unwrap();
        let field = ds.into_field().unwrap();
        assert_eq!(field.uwnd()[[0, 0, 0, 0]], 1.0);
        assert_eq!(field.uwnd()[[0, 0, 2, 1]], 6.0);
        assert!(field.uwnd()[[0, 1, 2, 1]].is_nan());
    }

    #[test]
    fn tagged_order_is_permuted() {
        // Stored as (lon, lat, level, time): value at (i, j, k) = 1 + 6i + 2j + k.
        let dims = r#""dims": ["lon", "lat", "level", "time"],"#;
        let ds: DatasetFile = serde_json::from_str(&base_json(dims)).unwrap();
        let field = ds.into_field().unwrap();
        // canonical (t=0, k=1, j=2, i=0) -> raw (0, 2, 1, 0) -> 1 + 4 + 1 = 6
        assert_eq!(field.uwnd()[[0, 1, 2, 0]], 6.0);
        assert_eq!(field.uwnd()[[0, 0, 0, 1]], 7.0);
    }

    #[test]
    fn shape_without_tags_is_inferred() {
        let ds: DatasetFile =
            serde_json::from_str(&base_json(r#""shape": [1, 3, 2, 2],"#)).unwrap();
        let field = ds.into_field().unwrap();
        // Length 2 fits both level and lon; the order closest to canonical,
        // (time, lat, level, lon), wins.
        assert_eq!(field.grid().shape(), [1, 2, 3, 2]);
        assert_eq!(field.uwnd()[[0, 1, 0, 0]], 3.0);
    }

    #[test]
    fn wrong_length_is_reported() {
        let dims = r#""dims": ["time", "level", "lat", "lon"],"#;
        let mut ds: DatasetFile = serde_json::from_str(&base_json(dims)).unwrap();
        ds.pv.pop();
        assert!(matches!(ds.into_field(), Err(JetError::ShapeMismatch { field: "pv", .. })));
    }

    #[test]
    fn pressure_file_derives_theta_from_temperature() {
        let json = r#"{
            "time": { "values": [0], "units": "days since 2000-01-01" },
            "level": { "kind": "pressure", "values": [1000, 250] },
            "lat": [10],
            "pv": [0.5, 3.0],
            "uwnd": [1.0, 20.0],
            "air_temperature": [300.0, 220.0]
        }"#;
        let ds: DatasetFile = serde_json::from_str(json).unwrap();
        let field = ds.into_field().unwrap();
        let theta = field.theta().unwrap();
        assert_abs_diff_eq!(theta[[0, 0, 0, 0]], 300.0, epsilon = 1e-9);
        assert_abs_diff_eq!(theta[[0, 1, 0, 0]], 220.0 * 4.0_f64.powf(0.286), epsilon = 1e-9);
    }

    #[test]
    fn written_dataset_reads_back() {
        let dims = r#""dims": ["time", "level", "lat", "lon"],"#;
        let ds: DatasetFile = serde_json::from_str(&base_json(dims)).unwrap();
        let field = ds.into_field().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        write_dataset(&path, &field).unwrap();
        let back = read_dataset(&path).unwrap();
        assert_eq!(back.grid(), field.grid());
        assert_eq!(back.uwnd()[[0, 1, 1, 0]], field.uwnd()[[0, 1, 1, 0]]);
        assert!(back.pv()[[0, 1, 2, 1]].is_nan());
    }
}
