//! Binary site prediction from a sensitivity surface.
//!
//! The threshold is either given directly or taken from the recommendations of
//! a report written by `evaluate`. With a presence mask, also prints how much of
//! the area is flagged and how many sites fall inside it.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use sensmap_core::{classify, summarize, trace_init::init_tracing, Grid, Recommendations, ThresholdMetric};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "classifier", about = "Classify a sensitivity surface into a 0/1 site prediction")]
struct Args {
    /// Surface grid JSON.
    #[arg(short, long)]
    surface: PathBuf,

    /// Explicit threshold; cells with value >= threshold are flagged.
    #[arg(short, long, conflicts_with_all = ["report", "metric"])]
    threshold: Option<f64>,

    /// Report JSON from `evaluate`, used with --metric.
    #[arg(short, long, requires = "metric")]
    report: Option<PathBuf>,

    /// Which recommended threshold to use from --report.
    #[arg(short, long, requires = "report")]
    metric: Option<ThresholdMetric>,

    /// Presence mask aligned to the surface; prints a capture summary.
    #[arg(short, long)]
    presence: Option<PathBuf>,

    /// Output prediction grid JSON.
    #[arg(short, long, default_value = "data/prediction.json")]
    output: PathBuf,
}

/// The part of an evaluation report this tool reads.
#[derive(Debug, Deserialize)]
struct ReportRecommendations {
    recommendations: Recommendations,
}

fn read_grid(path: &Path) -> Result<Grid> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing grid {}", path.display()))
}

/// Look up `metric` in a report's recommendations.
fn threshold_from_report(report_json: &str, metric: ThresholdMetric) -> Result<f64> {
    let report: ReportRecommendations =
        serde_json::from_str(report_json).context("parsing report recommendations")?;
    match report.recommendations.get(metric) {
        Some(t) => Ok(t),
        None => bail!("the report has no {metric} threshold (degenerate sample?)"),
    }
}

fn resolve_threshold(args: &Args) -> Result<f64> {
    match (args.threshold, &args.report, args.metric) {
        (Some(t), _, _) => Ok(t),
        (None, Some(path), Some(metric)) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            threshold_from_report(&text, metric)
        }
        _ => bail!("pass either --threshold or --report with --metric"),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let threshold = resolve_threshold(&args)?;
    let surface = read_grid(&args.surface)?;
    let prediction = classify(&surface, threshold);
    info!(threshold, cells = surface.valid_count(), "classified surface");

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&args.output, serde_json::to_string(&prediction)?)
        .with_context(|| format!("writing {}", args.output.display()))?;

    if let Some(path) = &args.presence {
        let presence = read_grid(path)?;
        let s = summarize(&prediction, &presence, threshold)?;
        eprintln!("\n{:<18} {:>10}", "threshold", format!("{:.3}", s.threshold));
        eprintln!("{:<18} {:>10}", "area cells", s.area_cells);
        eprintln!("{:<18} {:>10}", "flagged cells", s.flagged_cells);
        eprintln!("{:<18} {:>10.3}", "flagged fraction", s.flagged_fraction);
        eprintln!("{:<18} {:>10}", "site cells", s.site_cells);
        eprintln!("{:<18} {:>10}", "captured sites", s.captured_sites);
        eprintln!("{:<18} {:>10.3}", "captured fraction", s.captured_fraction);
        eprintln!("{:<18} {:>10.3}", "Kvamme gain", s.kvamme_gain);
    }

    info!(output = %args.output.display(), "done");
    Ok(())
}

// ── Unit tests ────────────────────────────────────────────────────────────────
