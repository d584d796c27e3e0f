//! Threshold evaluation: labelled sample → performance table → AUC and
//! recommended operating thresholds.
pub mod auc;
pub mod performance;
pub mod recommend;
pub mod sample;

pub use auc::auc;
pub use performance::{PerformanceRow, PerformanceTable};
pub use recommend::{Recommendations, ThresholdMetric};
pub use sample::{LabeledSample, LabeledValue};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Non-fatal sample conditions that leave metrics undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateSample {
    /// No site rows: sensitivity is undefined at every threshold.
    NoPositives,
    /// No background rows: specificity is undefined at every threshold.
    NoNegatives,
}

/// Everything a caller needs to report on one evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub n_positive: usize,
    pub n_negative: usize,
    /// Presence cells skipped because the surface was NoData there.
    pub dropped_sites: usize,
    pub auc: Option<f64>,
    pub recommendations: Recommendations,
    pub warnings: Vec<DegenerateSample>,
    pub table: PerformanceTable,
}

impl EvaluationReport {
    pub fn rows(&self) -> &[PerformanceRow] {
        self.table.rows()
    }

    pub fn is_degenerate(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Sweep every threshold of `sample` and pick the recommended operating points.
pub fn evaluate(sample: &LabeledSample) -> EvaluationReport {
    let table = PerformanceTable::sweep(sample);

    let mut warnings = Vec::new();
    if table.n_positive() == 0 {
        warn!("sample has no site rows; sensitivity and all recommendations are undefined");
        warnings.push(DegenerateSample::NoPositives);
    }
    if table.n_negative() == 0 {
        warn!("sample has no background rows; specificity and all recommendations are undefined");
        warnings.push(DegenerateSample::NoNegatives);
    }

    let recommendations = Recommendations::from_table(&table);
    let auc = auc(table.rows());
    debug!(
        thresholds = table.rows().len(),
        positives = table.n_positive(),
        negatives = table.n_negative(),
        ?auc,
        "threshold sweep complete"
    );

    EvaluationReport {
        n_positive: table.n_positive(),
        n_negative: table.n_negative(),
        dropped_sites: sample.dropped_sites,
        auc,
        recommendations,
        warnings,
        table,
    }
}
