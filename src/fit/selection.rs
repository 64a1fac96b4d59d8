//! Jet candidates and the wind-shear tie-break.
//!
//! Candidates are the strict relative extrema of `dθ/dφ` inside the fit
//! window: maxima in the south, minima in the north (the tropopause drops
//! fastest there in both cases).
//!
//! Selection rules:
//! 1. No candidate: no jet
//! 2. One candidate: that latitude
//! 3. Several: the candidate with the largest surface-to-tropopause shear.
//!    NaN shear never wins, ties keep the most equatorward-stored candidate,
//!    and if every shear is NaN the first candidate is kept

use crate::domain::Hemisphere;
use crate::math::{ExtremumKind, relative_extrema};

/// How the jet index was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    Only,
    MaxShear,
    /// Several candidates, none with a finite shear.
    FirstCandidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JetChoice {
    /// Index on the hemisphere latitude axis.
    pub index: usize,
    pub rule: SelectionRule,
}

/// Extremum kind that marks the jet in `hemisphere`.
pub fn extremum_kind(hemisphere: Hemisphere) -> ExtremumKind {
    match hemisphere {
        Hemisphere::South => ExtremumKind::Maximum,
        Hemisphere::North => ExtremumKind::Minimum,
    }
}

/// Candidate indices on the hemisphere axis.
///
/// `derivative` covers the fit window starting at `offset`.
pub fn jet_candidates(derivative: &[f64], offset: usize, hemisphere: Hemisphere) -> Vec<usize> {
    relative_extrema(derivative, extremum_kind(hemisphere))
        .into_iter()
        .map(|i| i + offset)
        .collect()
}

/// Pick one candidate. `shear` is indexed like the hemisphere axis.
pub fn select_jet(candidates: &[usize], shear: &[f64]) -> Option<JetChoice> {
    match candidates {
        [] => None,
        [only] => Some(JetChoice {
            index: *only,
            rule: SelectionRule::Only,
        }),
        [first, ..] => {
            let mut best: Option<(usize, f64)> = None;
            for &c in candidates {
                let s = shear.get(c).copied().unwrap_or(f64::NAN);
                if !s.is_finite() {
                    continue;
                }
                if best.is_none_or(|(_, b)| s > b) {
                    best = Some((c, s));
                }
            }
            Some(match best {
                Some((index, _)) => JetChoice {
                    index,
                    rule: SelectionRule::MaxShear,
                },
                None => JetChoice {
                    index: *first,
                    rule: SelectionRule::FirstCandidate,
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_extremum_wins_regardless_of_shear() {
        let der = [-0.5, -0.9, -1.4, -1.1, -0.7, -0.2];
        let cands = jet_candidates(&der, 3, Hemisphere::North);
        assert_eq!(cands, vec![5]);
        let shear = vec![50.0; 9];
        let choice = select_jet(&cands, &shear).unwrap();
        assert_eq!(choice.index, 5);
        assert_eq!(choice.rule, SelectionRule::Only);
    }

    #[test]
    fn monotonic_derivative_has_no_jet() {
        let der: Vec<f64> = (0..15).map(|i| 1.0 - 0.1 * i as f64).collect();
        let cands = jet_candidates(&der, 0, Hemisphere::South);
        assert!(cands.is_empty());
        assert_eq!(select_jet(&cands, &[]), None);
    }

    #[test]
    fn south_looks_for_maxima() {
        let der = [0.5, 0.9, 1.4, 1.1, 0.7];
        assert_eq!(jet_candidates(&der, 0, Hemisphere::South), vec![2]);
        assert!(jet_candidates(&der, 0, Hemisphere::North).is_empty());
    }

    #[test]
    fn largest_candidate_shear_wins_not_global_max() {
        let mut shear = vec![0.0; 12];
        shear[2] = 5.0;
        shear[6] = 22.0;
        shear[10] = 40.0;
        let choice = select_jet(&[2, 6], &shear).unwrap();
        assert_eq!(choice.index, 6);
        assert_eq!(choice.rule, SelectionRule::MaxShear);
    }

    #[test]
    fn nan_shear_never_wins_and_ties_keep_first() {
        let shear = [f64::NAN, 3.0, 7.0, 7.0, f64::NAN];
        assert_eq!(select_jet(&[0, 1], &shear).unwrap().index, 1);
        assert_eq!(select_jet(&[2, 3], &shear).unwrap().index, 2);
        assert_eq!(select_jet(&[4, 1], &shear).unwrap().index, 1);
    }

    #[test]
    fn all_nan_shear_keeps_first_candidate() {
        let shear = [f64::NAN; 6];
        let choice = select_jet(&[1, 4], &shear).unwrap();
        assert_eq!(choice.index, 1);
        assert_eq!(choice.rule, SelectionRule::FirstCandidate);
    }
}
