use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::performance::{PerformanceRow, PerformanceTable};
use crate::numeric::{first_argmax, first_argmin};

/// Criteria for picking an operating threshold from the performance table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMetric {
    /// Maximise sens + spec.
    SensSpec,
    /// Minimise |sens − spec|.
    Xover,
    /// Maximise Kvamme gain.
    KvammeGain,
    /// Maximise reach, ignoring rows where reach is exactly 1.
    Reach,
}

impl ThresholdMetric {
    pub const ALL: [ThresholdMetric; 4] = [
        ThresholdMetric::SensSpec,
        ThresholdMetric::Xover,
        ThresholdMetric::KvammeGain,
        ThresholdMetric::Reach,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThresholdMetric::SensSpec => "sens_spec",
            ThresholdMetric::Xover => "xover",
            ThresholdMetric::KvammeGain => "kvamme_gain",
            ThresholdMetric::Reach => "reach",
        }
    }
}

impl fmt::Display for ThresholdMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThresholdMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "sens_spec" | "sensspec" => Ok(ThresholdMetric::SensSpec),
            "xover" => Ok(ThresholdMetric::Xover),
            "kvamme_gain" | "kg" => Ok(ThresholdMetric::KvammeGain),
            "reach" => Ok(ThresholdMetric::Reach),
            other => Err(format!(
                "unknown threshold metric `{other}` (expected sens_spec, xover, kvamme_gain or reach)"
            )),
        }
    }
}

/// The four recommended thresholds. `None` means the metric is undefined for
/// every row of the table; no placeholder value is ever substituted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub sens_spec: Option<f64>,
    pub xover: Option<f64>,
    pub kvamme_gain: Option<f64>,
    pub reach: Option<f64>,
}

impl Recommendations {
    /// Pick each optimum from `table`. Ties go to the lowest threshold.
    pub fn from_table(table: &PerformanceTable) -> Self {
        let rows = table.rows();
        let pick = |idx: Option<usize>| idx.map(|i| rows[i].threshold);

        Self {
            sens_spec: pick(sens_spec_index(table)),
            xover: pick(first_argmin(rows.iter().map(|r| r.xover))),
            kvamme_gain: pick(first_argmax(rows.iter().map(|r| r.kvamme_gain))),
            reach: pick(first_argmax(rows.iter().map(reach_candidate))),
        }
    }

    pub fn get(&self, metric: ThresholdMetric) -> Option<f64> {
        match metric {
            ThresholdMetric::SensSpec => self.sens_spec,
            ThresholdMetric::Xover => self.xover,
            ThresholdMetric::KvammeGain => self.kvamme_gain,
            ThresholdMetric::Reach => self.reach,
        }
    }
}

/// Reach, with the degenerate value 1 treated as undefined.
fn reach_candidate(row: &PerformanceRow) -> f64 {
    if row.reach == 1.0 {
        f64::NAN
    } else {
        row.reach
    }
}

/// First row maximising sens + spec, compared on exact counts.
///
/// `tp/P + tn/N` ranks the same as `tp·N + tn·P`, which avoids float ties
/// drifting between rows.
fn sens_spec_index(table: &PerformanceTable) -> Option<usize> {
    let p = table.n_positive() as u128;
    let n = table.n_negative() as u128;
    if p == 0 || n == 0 {
        return None;
    }
    let mut best: Option<(usize, u128)> = None;
    for (i, r) in table.rows().iter().enumerate() {
        let score = r.true_positives as u128 * n + r.true_negatives as u128 * p;
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}
