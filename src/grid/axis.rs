//! Named array axes.
//!
//! Fields carry an explicit `AxisOrder` so the latitude axis is never guessed
//! from array lengths inside the algorithm. `AxisOrder::infer` exists for
//! untagged input only: it matches dimension lengths against the grid and
//! logs when the match is ambiguous.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::JetError;

/// A named dimension of a 4-D field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dim {
    Time,
    #[serde(alias = "lev")]
    Level,
    #[serde(alias = "latitude")]
    Lat,
    #[serde(alias = "longitude")]
    Lon,
}

impl Dim {
    pub fn name(self) -> &'static str {
        match self {
            Dim::Time => "time",
            Dim::Level => "level",
            Dim::Lat => "lat",
            Dim::Lon => "lon",
        }
    }
}

/// Order of the named dimensions in a raw array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisOrder([Dim; 4]);

impl AxisOrder {
    /// `(time, level, lat, lon)`: the layout every field is stored in.
    pub const CANONICAL: AxisOrder = AxisOrder([Dim::Time, Dim::Level, Dim::Lat, Dim::Lon]);

    pub fn new(dims: [Dim; 4]) -> Result<Self, JetError> {
        let order = AxisOrder(dims);
        let complete = AxisOrder::CANONICAL
            .0
            .iter()
            .all(|d| dims.iter().filter(|x| *x == d).count() == 1);
        if complete {
            Ok(order)
        } else {
            Err(JetError::InvalidAxisOrder {
                order: order.to_string(),
            })
        }
    }

    /// Build from a list of tags, e.g. the `dims` entry of a dataset file.
    pub fn from_tags(tags: &[Dim]) -> Result<Self, JetError> {
        let dims: [Dim; 4] = tags.try_into().map_err(|_| JetError::InvalidAxisOrder {
            order: format!("{tags:?}"),
        })?;
        AxisOrder::new(dims)
    }

    pub fn dims(&self) -> [Dim; 4] {
        self.0
    }

    /// Array axis holding `dim`.
    pub fn position(&self, dim: Dim) -> usize {
        self.0.iter().position(|d| *d == dim).unwrap_or(0)
    }

    /// Permutation that brings an array in this order to canonical order.
    pub fn to_canonical(&self) -> [usize; 4] {
        [
            self.position(Dim::Time),
            self.position(Dim::Level),
            self.position(Dim::Lat),
            self.position(Dim::Lon),
        ]
    }

    /// Assign names to the axes of `shape` by matching lengths.
    ///
    /// `lengths` are the coordinate lengths in canonical order. When several
    /// assignments fit (for instance `n_lat == n_lon`), the one closest to
    /// canonical order wins and the choice is logged.
    pub fn infer(shape: &[usize], lengths: [usize; 4]) -> Result<Self, JetError> {
        if shape.len() != 4 {
            return Err(JetError::AxisUnresolved {
                dim: "lat",
                shape: shape.to_vec(),
            });
        }

        let mut fits: Vec<[usize; 4]> = permutations()
            .into_iter()
            .filter(|perm| (0..4).all(|c| shape[perm[c]] == lengths[c]))
            .collect();

        if fits.is_empty() {
            let missing = AxisOrder::CANONICAL
                .0
                .iter()
                .zip(lengths.iter())
                .find(|(_, len)| !shape.contains(len))
                .map(|(d, _)| d.name())
                .unwrap_or("lat");
            return Err(JetError::AxisUnresolved {
                dim: missing,
                shape: shape.to_vec(),
            });
        }

        // Fewest displaced axes first, then lexicographic for determinism.
        fits.sort_by_key(|perm| {
            let displaced = (0..4).filter(|&c| perm[c] != c).count();
            (displaced, *perm)
        });
        let chosen = fits[0];

        let mut dims = [Dim::Time; 4];
        for (c, dim) in AxisOrder::CANONICAL.0.iter().enumerate() {
            dims[chosen[c]] = *dim;
        }
        let order = AxisOrder(dims);

        if fits.len() > 1 {
            warn!(
                shape = ?shape,
                lat_axis = chosen[2],
                candidates = fits.len(),
                "ambiguous axis lengths, assuming order {order}"
            );
        }
        Ok(order)
    }
}

impl fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|d| d.name()).collect();
        write!(f, "({})", names.join(", "))
    }
}

fn permutations() -> Vec<[usize; 4]> {
    let mut out = Vec::with_capacity(24);
    for a in 0..4 {
        for b in 0..4 {
            for c in 0..4 {
                for d in 0..4 {
                    let perm = [a, b, c, d];
                    let distinct = (0..4).all(|i| (i + 1..4).all(|j| perm[i] != perm[j]));
                    if distinct {
                        out.push(perm);
                    }
                }
            }
        }
    }
    out
}
