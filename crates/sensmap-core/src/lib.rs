//! Landscape sensitivity surfaces: weighted reclassification of environmental
//! rasters, aggregation into one surface, and threshold selection against
//! known site locations.
//!
//! Data flows forward only:
//! rasters → [`reclassify`] → [`sum`] → [`LabeledSample`] → [`evaluate`] → [`classify`].

pub mod aggregate;
pub mod breakpoints;
pub mod classify;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod grid;
pub mod mask;
pub mod numeric;
pub mod pipeline;
pub mod reclassify;
#[cfg(feature = "cli")]
pub mod trace_init;

pub use aggregate::sum;
pub use breakpoints::{BreakpointTable, Interval, IntervalSpec};
pub use classify::{classify, summarize, ClassificationSummary};
pub use config::{LayerConfig, ModelConfig, PresenceSource};
pub use error::{Result, SensError};
pub use evaluation::{
    evaluate, DegenerateSample, EvaluationReport, LabeledSample, PerformanceRow, PerformanceTable,
    Recommendations, ThresholdMetric,
};
pub use grid::{Extent, Grid, GridShape, DEFAULT_NODATA};
pub use mask::{extract_positives, rasterize_points, RasterizedSites, SitePoint};
pub use pipeline::{ModelRun, SensitivityModel};
pub use reclassify::reclassify;
