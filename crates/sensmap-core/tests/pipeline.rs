use sensmap_core::{
    rasterize_points, BreakpointTable, Extent, Grid, ModelConfig, SensitivityModel, SitePoint,
    ThresholdMetric, DEFAULT_NODATA,
};

const W: usize = 20;
const H: usize = 10;

fn extent() -> Extent {
    Extent::new(500_000.0, 502_000.0, 4_100_000.0, 4_101_000.0)
}

/// Slope rises west → east; distance to water rises south → north.
fn rasters() -> (Grid, Grid) {
    let mut slope = Grid::new(W, H, extent(), DEFAULT_NODATA, 0.0);
    let mut d2w = Grid::new(W, H, extent(), DEFAULT_NODATA, 0.0);
    for r in 0..H {
        for c in 0..W {
            slope.set(r, c, c as f32 * 2.0);
            d2w.set(r, c, r as f32 * 100.0);
        }
    }
    // a hole in one layer must punch through the surface
    d2w.set(5, 5, DEFAULT_NODATA);
    (slope, d2w)
}

fn model() -> SensitivityModel {
    SensitivityModel::new(vec![
        BreakpointTable::from_triples(
            "slope",
            &[(0.0, 8.0, 3.0), (8.0, 20.0, 2.0), (20.0, 30.0, 1.0), (30.0, 90.0, 0.0)],
        )
        .unwrap(),
        BreakpointTable::from_triples(
            "d2w",
            &[(0.0, 300.0, 3.0), (300.0, 600.0, 1.0), (600.0, f64::INFINITY, 0.0)],
        )
        .unwrap(),
    ])
}

/// Sites clustered on gentle slopes near water, with one outlier.
fn sites(template: &Grid) -> Grid {
    let mut points = Vec::new();
    for (r, c) in [(0, 0), (0, 2), (1, 1), (1, 3), (2, 0), (2, 2), (0, 5), (8, 15)] {
        let (x, y) = template.cell_center(r, c);
        points.push(SitePoint { x, y });
    }
    points.push(SitePoint { x: 0.0, y: 0.0 });
    let burned = rasterize_points(template, &points);
    assert_eq!(burned.cells, 8);
    assert_eq!(burned.outside, 1);
    burned.mask
}

#[test]
fn end_to_end_run_discriminates_sites() {
    let (slope, d2w) = rasters();
    let presence = sites(&slope);
    let run = model().run(&[slope, d2w], &presence).unwrap();

    assert_eq!(run.surface.valid_count(), W * H - 1);
    assert_eq!(run.surface.max_value(), Some(6.0));
    assert_eq!(run.surface.min_value(), Some(0.0));

    let report = &run.report;
    assert_eq!(report.n_negative, W * H - 1);
    assert_eq!(report.n_positive, 8);
    assert!(report.warnings.is_empty());

    let auc = report.auc.unwrap();
    assert!(auc > 0.8 && auc <= 1.0, "auc = {auc}");

    for m in ThresholdMetric::ALL {
        let t = run.threshold(m).unwrap();
        assert!(report.table.row_at(t).is_some(), "{m} threshold {t} must be a table row");
    }

    let reach_t = report.recommendations.reach.unwrap();
    assert!(report.table.row_at(reach_t).unwrap().reach < 1.0);

    let summary = run.summarize(ThresholdMetric::KvammeGain, &presence).unwrap();
    assert!(summary.kvamme_gain > 0.0);
    assert!(summary.flagged_fraction < summary.captured_fraction);
}

#[test]
fn config_round_trip_drives_the_same_model() {
    let json = serde_json::json!({
        "layers": [
            { "variable": "slope", "raster": "slope.json",
              "breakpoints": [ {"from": 0, "to": 8, "weight": 3}, {"from": 8, "to": 20, "weight": 2},
                               {"from": 20, "to": 30, "weight": 1}, {"from": 30, "to": 90, "weight": 0} ] },
            { "variable": "d2w", "raster": "d2w.json",
              "breakpoints": [ {"from": 0, "to": 300, "weight": 3}, {"from": 300, "to": 600, "weight": 1},
                               {"from": 600, "to": null, "weight": 0} ] }
        ],
        "presence": { "mask": "mask.json" }
    });
    let cfg: ModelConfig = serde_json::from_value(json).unwrap();
    assert_eq!(cfg.model().unwrap(), model());
}

#[test]
fn grids_survive_json_with_nodata() {
    let (_, d2w) = rasters();
    let text = serde_json::to_string(&d2w).unwrap();
    let back: Grid = serde_json::from_str(&text).unwrap();
    assert_eq!(back, d2w);
}
