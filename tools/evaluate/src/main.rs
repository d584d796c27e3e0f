//! Runs the model described by a config file: reclassifies and sums the layers,
//! sweeps every threshold against the known sites, and writes the surface grid,
//! the evaluation report and (optionally) the binary prediction as JSON.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use sensmap_core::{
    rasterize_points, trace_init::init_tracing, EvaluationReport, Grid, ModelConfig, PresenceSource,
    SitePoint, ThresholdMetric,
};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "evaluate", about = "Build the sensitivity surface and evaluate every threshold against known sites")]
struct Args {
    /// Model configuration JSON (layers, breakpoints, presence source).
    #[arg(short, long)]
    config: PathBuf,

    /// Output directory for surface.json, report.json and prediction files.
    #[arg(short, long, default_value = "data/out")]
    output: PathBuf,

    /// Classify the surface with this metric's threshold (overrides the config).
    #[arg(short, long)]
    metric: Option<ThresholdMetric>,

    /// Print the full performance table.
    #[arg(long)]
    table: bool,
}

// ── JSON helpers ──────────────────────────────────────────────────────────────

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))
}

// ── Inputs ────────────────────────────────────────────────────────────────────

fn load_config(path: &Path) -> Result<ModelConfig> {
    let mut cfg: ModelConfig = read_json(path)?;
    if cfg.layers.is_empty() {
        bail!("{}: config has no layers", path.display());
    }
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    cfg.resolve_paths(base);
    Ok(cfg)
}

fn load_presence(source: &PresenceSource, template: &Grid) -> Result<Grid> {
    match source {
        PresenceSource::Mask(path) => read_json(path),
        PresenceSource::Sites(path) => {
            let points: Vec<SitePoint> = read_json(path)?;
            let burned = rasterize_points(template, &points);
            info!(
                points = points.len(),
                cells = burned.cells,
                outside = burned.outside,
                "rasterized site points"
            );
            Ok(burned.mask)
        }
    }
}

// ── Reporting ─────────────────────────────────────────────────────────────────

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "undefined".to_string(), |x| format!("{x:.3}"))
}

fn print_report(report: &EvaluationReport, full_table: bool) {
    eprintln!(
        "\nsites: {}  background cells: {}  dropped sites: {}  AUC: {}",
        report.n_positive,
        report.n_negative,
        report.dropped_sites,
        fmt_opt(report.auc)
    );
    for w in &report.warnings {
        eprintln!("warning: degenerate sample ({w:?})");
    }

    eprintln!("\n{:<12} {:>10}", "Metric", "Threshold");
    eprintln!("{}", "-".repeat(23));
    for m in ThresholdMetric::ALL {
        eprintln!("{:<12} {:>10}", m.as_str(), fmt_opt(report.recommendations.get(m)));
    }

    if full_table {
        eprintln!(
            "\n{:>10} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7}",
            "Threshold", "Sens", "Spec", "Back", "Xover", "KG", "Reach"
        );
        eprintln!("{}", "-".repeat(60));
        for r in report.rows() {
            eprintln!(
                "{:>10.3} {:>7.3} {:>7.3} {:>7.3} {:>7.3} {:>7.3} {:>7.3}",
                r.threshold, r.sensitivity, r.specificity, r.back_pct, r.xover, r.kvamme_gain, r.reach
            );
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let cfg = load_config(&args.config)?;
    let model = cfg.model().context("invalid breakpoint configuration")?;

    let rasters = cfg
        .layers
        .iter()
        .map(|layer| read_json::<Grid>(&layer.raster))
        .collect::<Result<Vec<_>>>()?;
    info!(layers = rasters.len(), "loaded rasters");

    let presence = load_presence(&cfg.presence, &rasters[0])?;
    let run = model.run(&rasters, &presence)?;

    fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    write_json(&args.output.join("surface.json"), &run.surface)?;
    write_json(&args.output.join("report.json"), &run.report)?;

    print_report(&run.report, args.table);

    if let Some(metric) = args.metric.or(cfg.classify_with) {
        let prediction = run.classify(metric)?;
        let summary = run.summarize(metric, &presence)?;
        write_json(&args.output.join("prediction.json"), &prediction)?;
        write_json(&args.output.join("prediction_summary.json"), &summary)?;
        eprintln!(
            "\n{metric} threshold {:.3}: {:.1}% of area flagged, {}/{} sites captured, KG {:.3}",
            summary.threshold,
            summary.flagged_fraction * 100.0,
            summary.captured_sites,
            summary.site_cells,
            summary.kvamme_gain
        );
    }

    info!(output = %args.output.display(), "done");
    Ok(())
}

// ── Unit tests ────────────────────────────────────────────────────────────────
