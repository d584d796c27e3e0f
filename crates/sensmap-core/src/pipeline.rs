//! Pipeline orchestrator: runs every stage in order.

use tracing::info;

use crate::aggregate::sum;
use crate::breakpoints::BreakpointTable;
use crate::classify::{classify, summarize, ClassificationSummary};
use crate::error::{Result, SensError};
use crate::evaluation::{evaluate, EvaluationReport, LabeledSample, ThresholdMetric};
use crate::grid::Grid;
use crate::reclassify::reclassify;

/// A weighted-overlay model: one breakpoint table per environmental layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityModel {
    tables: Vec<BreakpointTable>,
}

/// Full output of one model run.
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub surface: Grid,
    pub report: EvaluationReport,
}

impl SensitivityModel {
    pub fn new(tables: Vec<BreakpointTable>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[BreakpointTable] {
        &self.tables
    }

    /// Reclassify `rasters[i]` with table `i`.
    pub fn weight_layers(&self, rasters: &[Grid]) -> Result<Vec<Grid>> {
        if rasters.len() != self.tables.len() {
            return Err(SensError::LayerCount {
                tables: self.tables.len(),
                layers: rasters.len(),
            });
        }
        self.tables
            .iter()
            .zip(rasters)
            .map(|(table, raster)| reclassify(raster, table))
            .collect()
    }

    /// Sum of the weighted layers.
    pub fn surface(&self, rasters: &[Grid]) -> Result<Grid> {
        let weighted = self.weight_layers(rasters)?;
        sum(&weighted)
    }

    /// Run the full pipeline for the given rasters and presence mask.
    ///
    /// Pipeline order:
    ///   1. Reclassify each raster through its table
    ///   2. Sum into the sensitivity surface
    ///   3. Build the labelled sample from surface and mask
    ///   4. Sweep thresholds, pick recommendations, compute AUC
    pub fn run(&self, rasters: &[Grid], presence: &Grid) -> Result<ModelRun> {
        let surface = self.surface(rasters)?;
        let sample = LabeledSample::from_surface(&surface, presence)?;
        let report = evaluate(&sample);

        info!(
            layers = self.tables.len(),
            cells = surface.valid_count(),
            sites = report.n_positive,
            auc = ?report.auc,
            "model run complete"
        );
        Ok(ModelRun { surface, report })
    }
}

impl ModelRun {
    /// The threshold recommended by `metric`, or `UndefinedThreshold`.
    pub fn threshold(&self, metric: ThresholdMetric) -> Result<f64> {
        self.report
            .recommendations
            .get(metric)
            .ok_or(SensError::UndefinedThreshold(metric))
    }

    /// Binary prediction at the threshold recommended by `metric`.
    pub fn classify(&self, metric: ThresholdMetric) -> Result<Grid> {
        Ok(classify(&self.surface, self.threshold(metric)?))
    }

    /// Prediction summary at the threshold recommended by `metric`.
    pub fn summarize(&self, metric: ThresholdMetric, presence: &Grid) -> Result<ClassificationSummary> {
        let threshold = self.threshold(metric)?;
        summarize(&classify(&self.surface, threshold), presence, threshold)
    }
}
