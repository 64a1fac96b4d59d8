//! Projection of fields onto an iso-surface of another field.
//!
//! The jet search needs potential temperature and zonal wind on the surface
//! where PV equals the tropopause threshold. This happens in two steps:
//!
//! - `SurfaceLocator::locate` scans each `(time, lat, lon)` column upward from
//!   the surface level and records the first adjacent pair of finite samples
//!   that brackets the target value, as `(lower level, fraction)`
//! - every source is then sampled at those positions, so theta and wind are
//!   always read at the same height
//!
//! Columns without a crossing give NaN. That covers targets outside the
//! observed range, all-missing columns and gaps below ground.

use ndarray::{Array3, ArrayView1, ArrayView4, Axis, Zip, s};

/// Where a column crosses the target value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Level index below (or at) the crossing.
    pub lower: usize,
    /// Linear position in `[0, 1]` between `lower` and `lower + 1`.
    pub frac: f64,
}

/// A quantity that can be sampled at a crossing.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// A 1-D level coordinate, identical for every column.
    Levels(&'a [f64]),
    /// A 4-D field co-located with the target field.
    Field(ArrayView4<'a, f64>),
}

/// Crossing positions of every `(time, lat, lon)` column.
#[derive(Debug, Clone)]
pub struct SurfaceLocator {
    crossings: Array3<Option<Crossing>>,
}

impl SurfaceLocator {
    /// Locate where `target` (canonical order) equals `value`.
    pub fn locate(target: ArrayView4<'_, f64>, value: f64) -> Self {
        let (nt, _, nlat, nlon) = target.dim();
        let mut crossings = Array3::from_elem((nt, nlat, nlon), None);
        for (t, block) in target.axis_iter(Axis(0)).enumerate() {
            for j in 0..nlat {
                for i in 0..nlon {
                    let column = block.slice(s![.., j, i]);
                    crossings[[t, j, i]] = find_crossing(column, value);
                }
            }
        }
        Self { crossings }
    }

    /// Sample `source` at the located crossings, `(time, lat, lon)`.
    pub fn sample(&self, source: Source<'_>) -> Array3<f64> {
        let mut out = Array3::from_elem(self.crossings.dim(), f64::NAN);
        match source {
            Source::Levels(levels) => {
                Zip::from(&mut out)
                    .and(&self.crossings)
                    .for_each(|o, c| {
                        if let Some(c) = c {
                            *o = lerp(levels, *c);
                        }
                    });
            }
            Source::Field(field) => {
                Zip::indexed(&mut out)
                    .and(&self.crossings)
                    .for_each(|(t, j, i), o, c| {
                        if let Some(c) = c {
                            let column = field.slice(s![t, .., j, i]);
                            *o = lerp_view(column, *c);
                        }
                    });
            }
        }
        out
    }
}

/// Interpolates sources onto the surface `target == value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalInterpolator {
    pub value: f64,
}

impl VerticalInterpolator {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    /// Crossing positions of `target`, for sampling several sources.
    pub fn locate(&self, target: ArrayView4<'_, f64>) -> SurfaceLocator {
        SurfaceLocator::locate(target, self.value)
    }

    /// One source on the iso-surface.
    pub fn interpolate(&self, source: Source<'_>, target: ArrayView4<'_, f64>) -> Array3<f64> {
        self.locate(target).sample(source)
    }

    /// Several sources against one shared set of crossings.
    pub fn interpolate_many(
        &self,
        sources: &[Source<'_>],
        target: ArrayView4<'_, f64>,
    ) -> Vec<Array3<f64>> {
        let locator = self.locate(target);
        sources.iter().map(|s| locator.sample(*s)).collect()
    }
}

fn find_crossing(column: ArrayView1<'_, f64>, value: f64) -> Option<Crossing> {
    let n = column.len();
    if n == 1 {
        return (column[0] == value).then_some(Crossing { lower: 0, frac: 0.0 });
    }
    for k in 0..n.saturating_sub(1) {
        let (a, b) = (column[k], column[k + 1]);
        if !(a.is_finite() && b.is_finite()) {
            continue;
        }
        if a.min(b) <= value && value <= a.max(b) {
            let frac = if a == value || a == b {
                0.0
            } else if b == value {
                1.0
            } else {
                (value - a) / (b - a)
            };
            return Some(Crossing { lower: k, frac });
        }
    }
    None
}

fn lerp(values: &[f64], c: Crossing) -> f64 {
    lerp_view(ArrayView1::from(values), c)
}

fn lerp_view(values: ArrayView1<'_, f64>, c: Crossing) -> f64 {
    if c.frac == 0.0 {
        return values[c.lower];
    }
    let upper = values[c.lower + 1];
    if c.frac == 1.0 {
        return upper;
    }
    let lower = values[c.lower];
    lower + c.frac * (upper - lower)
}
