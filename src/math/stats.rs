//! Small order statistics used by the zonal reductions.

/// Median of the finite values in `values`.
///
/// Even counts average the two middle values. Returns `None` when no finite
/// value is present.
pub fn nan_median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    median_mut(&mut finite)
}

fn median_mut(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_skips_missing_values() {
        assert_eq!(nan_median([3.0, f64::NAN, 1.0, 2.0]), Some(2.0));
        assert_eq!(nan_median([4.0, 1.0, f64::NAN, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn all_missing_has_no_median() {
        assert_eq!(nan_median([f64::NAN, f64::INFINITY]), None);
        assert_eq!(nan_median(std::iter::empty()), None);
    }
}
