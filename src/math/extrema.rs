//! Relative extrema of a sampled curve.
//!
//! Only interior samples strictly greater (or smaller) than both neighbours
//! qualify. Plateaus and endpoints are never reported, and any comparison with
//! NaN fails, so masked samples cannot become extrema.

/// Which kind of relative extremum to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    Maximum,
    Minimum,
}

/// Indices of strict relative extrema, in ascending order.
pub fn relative_extrema(values: &[f64], kind: ExtremumKind) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    values
        .windows(3)
        .enumerate()
        .filter_map(|(i, w)| {
            let hit = match kind {
                ExtremumKind::Maximum => w[1] > w[0] && w[1] > w[2],
                ExtremumKind::Minimum => w[1] < w[0] && w[1] < w[2],
            };
            hit.then_some(i + 1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_interior_maxima_and_minima() {
        let v = [0.0, 2.0, 1.0, 3.0, -1.0, 0.5];
        assert_eq!(relative_extrema(&v, ExtremumKind::Maximum), vec![1, 3]);
        assert_eq!(relative_extrema(&v, ExtremumKind::Minimum), vec![2, 4]);
    }

    #[test]
    fn monotonic_curve_has_none() {
        let v: Vec<f64> = (0..20).map(|i| -(i as f64) * 0.3).collect();
        assert!(relative_extrema(&v, ExtremumKind::Maximum).is_empty());
        assert!(relative_extrema(&v, ExtremumKind::Minimum).is_empty());
    }

    #[test]
    fn plateaus_and_nan_are_ignored() {
        let v = [0.0, 1.0, 1.0, 0.0, f64::NAN, -1.0, 0.0];
        assert!(relative_extrema(&v, ExtremumKind::Maximum).is_empty());
        assert!(relative_extrema(&v, ExtremumKind::Minimum).is_empty());
    }
}
