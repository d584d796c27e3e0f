//! Threshold sweep: one performance row per achievable threshold.
//!
//! A row is classified positive when `value >= threshold`. Candidate
//! thresholds are every distinct value in the sample, ascending, plus one
//! synthetic threshold `max + 1` at which nothing is positive. Over that
//! sweep sensitivity never rises and specificity never falls.

#[cfg(feature = "threading")]
use rayon::prelude::*;
use serde::Serialize;

use super::sample::LabeledSample;
use crate::numeric::{next_up, ratio, round3};

/// Offset of the synthetic threshold above the largest observed value. Where
/// the offset vanishes in f64 rounding the next representable value is used.
pub const SYNTHETIC_THRESHOLD_OFFSET: f64 = 1.0;

/// Discrimination at one threshold. Metric fields are NaN when undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceRow {
    pub threshold: f64,
    /// True positive rate.
    pub sensitivity: f64,
    /// True negative rate.
    pub specificity: f64,
    /// Fraction of the background flagged positive (`1 − specificity`).
    pub back_pct: f64,
    /// `|sens + back_pct − 1|`, rounded.
    pub xover: f64,
    /// Kvamme gain `1 − back_pct / sens`, rounded; NaN when sens = 0.
    pub kvamme_gain: f64,
    /// `1 − (1 − sens) / spec`, rounded; NaN when spec = 0.
    pub reach: f64,
    pub true_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
}

impl PerformanceRow {
    fn at(threshold: f64, neg: &[f32], pos: &[f32]) -> Self {
        let below = |sorted: &[f32]| sorted.partition_point(|&v| (v as f64) < threshold);

        let false_negatives = below(pos);
        let true_positives = pos.len() - false_negatives;
        let true_negatives = below(neg);
        let false_positives = neg.len() - true_negatives;

        let sensitivity = ratio(true_positives as f64, pos.len() as f64);
        let specificity = ratio(true_negatives as f64, neg.len() as f64);
        let back_pct = 1.0 - specificity;

        let xover = round3((sensitivity + back_pct - 1.0).abs());
        let kvamme_gain = if sensitivity == 0.0 {
            f64::NAN
        } else {
            round3(1.0 - back_pct / sensitivity)
        };
        let reach = if specificity == 0.0 {
            f64::NAN
        } else {
            round3(1.0 - (1.0 - sensitivity) / specificity)
        };

        Self {
            threshold,
            sensitivity,
            specificity,
            back_pct,
            xover,
            kvamme_gain,
            reach,
            true_positives,
            false_negatives,
            true_negatives,
            false_positives,
        }
    }

    /// `sens + spec`, NaN if either is undefined.
    pub fn sens_plus_spec(&self) -> f64 {
        self.sensitivity + self.specificity
    }
}

/// Full sweep over a labelled sample. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceTable {
    rows: Vec<PerformanceRow>,
    n_positive: usize,
    n_negative: usize,
}

impl PerformanceTable {
    pub fn sweep(sample: &LabeledSample) -> Self {
        let (neg, pos) = sample.sorted_partitions();
        let thresholds = candidate_thresholds(&neg, &pos);

        #[cfg(feature = "threading")]
        let rows = thresholds
            .par_iter()
            .map(|&t| PerformanceRow::at(t, &neg, &pos))
            .collect();
        #[cfg(not(feature = "threading"))]
        let rows = thresholds
            .iter()
            .map(|&t| PerformanceRow::at(t, &neg, &pos))
            .collect();

        Self {
            rows,
            n_positive: pos.len(),
            n_negative: neg.len(),
        }
    }

    pub fn rows(&self) -> &[PerformanceRow] {
        &self.rows
    }

    pub fn n_positive(&self) -> usize {
        self.n_positive
    }

    pub fn n_negative(&self) -> usize {
        self.n_negative
    }

    /// The row for an exact threshold value.
    pub fn row_at(&self, threshold: f64) -> Option<&PerformanceRow> {
        self.rows.iter().find(|r| r.threshold == threshold)
    }

}

/// Distinct values of both partitions, ascending, plus the synthetic maximum.
fn candidate_thresholds(neg: &[f32], pos: &[f32]) -> Vec<f64> {
    let mut values: Vec<f64> = neg.iter().chain(pos).map(|&v| v as f64).collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    if let Some(&max) = values.last() {
        let top = max + SYNTHETIC_THRESHOLD_OFFSET;
        values.push(if top > max { top } else { next_up(max) });
    }
    values
}
