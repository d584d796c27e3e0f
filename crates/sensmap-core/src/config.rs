//! Model configuration file.
//!
//! ```json
//! {
//!   "layers": [
//!     { "variable": "slope", "raster": "slope.json",
//!       "breakpoints": [ {"from": 0, "to": 5, "weight": 3},
//!                        {"from": 5, "to": null, "weight": 0} ] }
//!   ],
//!   "presence": { "sites": "sites.json" },
//!   "classify_with": "kvamme_gain"
//! }
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::breakpoints::{BreakpointTable, IntervalSpec};
use crate::error::Result;
use crate::evaluation::ThresholdMetric;
use crate::pipeline::SensitivityModel;

/// One environmental layer and its reclassification table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub variable: String,
    /// Grid JSON file for this variable.
    pub raster: PathBuf,
    pub breakpoints: Vec<IntervalSpec>,
}

impl LayerConfig {
    pub fn table(&self) -> Result<BreakpointTable> {
        BreakpointTable::from_specs(self.variable.clone(), &self.breakpoints)
    }
}

/// Where known site locations come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceSource {
    /// A presence-mask grid JSON aligned to the layers.
    Mask(PathBuf),
    /// A JSON array of `{x, y}` site points, burned into a mask.
    Sites(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub layers: Vec<LayerConfig>,
    pub presence: PresenceSource,
    /// Metric used to produce the binary prediction, if any.
    #[serde(default)]
    pub classify_with: Option<ThresholdMetric>,
}

impl ModelConfig {
    /// Validate every breakpoint table and build the model.
    pub fn model(&self) -> Result<SensitivityModel> {
        let tables = self.layers.iter().map(LayerConfig::table).collect::<Result<Vec<_>>>()?;
        Ok(SensitivityModel::new(tables))
    }

    /// Make relative raster and presence paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        for layer in &mut self.layers {
            resolve(&mut layer.raster);
        }
        match &mut self.presence {
            PresenceSource::Mask(p) | PresenceSource::Sites(p) => resolve(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensError;

    const CONFIG: &str = r#"{
        "layers": [
            { "variable": "slope", "raster": "slope.json",
              "breakpoints": [ {"from": 0, "to": 5, "weight": 3},
                               {"from": 5, "to": null, "weight": 0} ] },
            { "variable": "d2w", "raster": "/abs/d2w.json",
              "breakpoints": [ {"from": null, "to": 250, "weight": 2},
                               {"from": 250, "to": null, "weight": 0} ] }
        ],
        "presence": { "sites": "sites.json" },
        "classify_with": "kvamme_gain"
    }"#;

    #[test]
    fn parses_and_builds_model() {
        let cfg: ModelConfig = serde_json::from_str(CONFIG).unwrap();
        assert_eq!(cfg.classify_with, Some(ThresholdMetric::KvammeGain));
        let model = cfg.model().unwrap();
        assert_eq!(model.tables().len(), 2);
        assert_eq!(model.tables()[1].weight_for(-3.0).unwrap(), 2.0);
        assert_eq!(model.tables()[0].weight_for(1.0e4).unwrap(), 0.0);
    }

    #[test]
    fn resolves_relative_paths_only() {
        let mut cfg: ModelConfig = serde_json::from_str(CONFIG).unwrap();
        cfg.resolve_paths(Path::new("/data/run1"));
        assert_eq!(cfg.layers[0].raster, PathBuf::from("/data/run1/slope.json"));
        assert_eq!(cfg.layers[1].raster, PathBuf::from("/abs/d2w.json"));
        assert_eq!(cfg.presence, PresenceSource::Sites(PathBuf::from("/data/run1/sites.json")));
    }

    #[test]
    fn invalid_table_surfaces_variable_name() {
        let mut cfg: ModelConfig = serde_json::from_str(CONFIG).unwrap();
        cfg.layers[0].breakpoints.swap(0, 1);
        match cfg.model() {
            Err(SensError::InvalidBreakpoints { variable, .. }) => assert_eq!(variable, "slope"),
            other => panic!("expected InvalidBreakpoints, got {other:?}"),
        }
    }
}
