//! Browser bindings. Every entry point takes JSON text and returns either a
//! plain JS object (via serde-wasm-bindgen) or a typed array of cell values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use sensmap_core::{
    classify as classify_surface, evaluate as evaluate_sample, BreakpointTable, EvaluationReport, Grid,
    LabeledSample, SensitivityModel,
};

#[derive(Deserialize)]
struct EvaluateRequest {
    surface: Grid,
    presence: Grid,
}

#[derive(Deserialize)]
struct RunRequest {
    tables: Vec<BreakpointTable>,
    rasters: Vec<Grid>,
    presence: Grid,
}

#[derive(Serialize)]
struct RunResponse<'a> {
    surface: &'a Grid,
    report: &'a EvaluationReport,
}

fn to_js(e: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{e:#}"))
}

fn evaluate_json(request_json: &str) -> Result<EvaluationReport> {
    let req: EvaluateRequest = serde_json::from_str(request_json).context("invalid evaluate request")?;
    let sample = LabeledSample::from_surface(&req.surface, &req.presence)?;
    Ok(evaluate_sample(&sample))
}

/// Evaluate a ready-made surface against a presence mask.
/// Request: `{ "surface": Grid, "presence": Grid }`. Returns the evaluation report.
#[wasm_bindgen]
pub fn evaluate(request_json: &str) -> Result<JsValue, JsValue> {
    let report = evaluate_json(request_json).map_err(to_js)?;
    Ok(serde_wasm_bindgen::to_value(&report)?)
}

/// Reclassify, sum and evaluate in one call.
/// Request: `{ "tables": [BreakpointTable], "rasters": [Grid], "presence": Grid }`.
/// Returns `{ surface, report }`.
#[wasm_bindgen]
pub fn run_model(request_json: &str) -> Result<JsValue, JsValue> {
    let run = || -> Result<_> {
        let req: RunRequest = serde_json::from_str(request_json).context("invalid model request")?;
        let model = SensitivityModel::new(req.tables);
        Ok(model.run(&req.rasters, &req.presence)?)
    };
    let run = run().map_err(to_js)?;
    let response = RunResponse { surface: &run.surface, report: &run.report };
    Ok(serde_wasm_bindgen::to_value(&response)?)
}

/// 0/1 prediction cells (NoData kept) for `surface_json` at `threshold`.
#[wasm_bindgen]
pub fn classify(surface_json: &str, threshold: f64) -> Result<js_sys::Float32Array, JsValue> {
    let surface: Grid = serde_json::from_str(surface_json)
        .map_err(|e| JsValue::from_str(&format!("invalid surface: {e}")))?;
    let prediction = classify_surface(&surface, threshold);
    Ok(js_sys::Float32Array::from(prediction.data.as_slice()))
}
