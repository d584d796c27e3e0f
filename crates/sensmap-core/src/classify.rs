use serde::Serialize;

use crate::error::Result;
use crate::grid::Grid;
use crate::numeric::{ratio, round3};

/// Binary prediction: 1 where `value >= threshold`, else 0. NoData propagates;
/// a surface sentinel of 0 or 1 is replaced so it cannot hide predictions.
pub fn classify(surface: &Grid, threshold: f64) -> Grid {
    let cells = surface
        .data
        .iter()
        .map(|&v| {
            if surface.is_nodata(v) {
                None
            } else if v as f64 >= threshold {
                Some(1.0)
            } else {
                Some(0.0)
            }
        })
        .collect();
    surface.derive(cells)
}

/// How a binary prediction grid covers the study area and the known sites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationSummary {
    pub threshold: f64,
    /// Valid cells in the study area.
    pub area_cells: usize,
    /// Valid cells predicted positive.
    pub flagged_cells: usize,
    /// Fraction of the study area predicted positive, rounded.
    pub flagged_fraction: f64,
    /// Presence cells on valid prediction cells.
    pub site_cells: usize,
    /// Presence cells predicted positive.
    pub captured_sites: usize,
    /// Fraction of presence cells predicted positive, rounded; NaN without sites.
    pub captured_fraction: f64,
    /// `1 − flagged_fraction / captured_fraction`, rounded; NaN when nothing is captured.
    pub kvamme_gain: f64,
}

/// Summarise `prediction` (output of [`classify`]) against a presence mask.
pub fn summarize(prediction: &Grid, presence: &Grid, threshold: f64) -> Result<ClassificationSummary> {
    prediction.ensure_aligned(presence)?;

    let mut area_cells = 0usize;
    let mut flagged_cells = 0usize;
    let mut site_cells = 0usize;
    let mut captured_sites = 0usize;
    for idx in 0..prediction.len() {
        let Some(v) = prediction.value_at(idx) else {
            continue;
        };
        let flagged = v >= 1.0;
        area_cells += 1;
        flagged_cells += usize::from(flagged);
        if presence.value_at(idx).is_some() {
            site_cells += 1;
            captured_sites += usize::from(flagged);
        }
    }

    let flagged_fraction = ratio(flagged_cells as f64, area_cells as f64);
    let captured_fraction = ratio(captured_sites as f64, site_cells as f64);
    let kvamme_gain = if captured_fraction == 0.0 {
        f64::NAN
    } else {
        round3(1.0 - flagged_fraction / captured_fraction)
    };

    Ok(ClassificationSummary {
        threshold,
        area_cells,
        flagged_cells,
        flagged_fraction: round3(flagged_fraction),
        site_cells,
        captured_sites,
        captured_fraction: round3(captured_fraction),
        kvamme_gain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DEFAULT_NODATA;

    const ND: f32 = DEFAULT_NODATA;

    #[test]
    fn threshold_is_inclusive_and_nodata_propagates() {
        let surface = Grid::from_cells(vec![0.0, 10.0, ND, 20.0, 9.99, f32::NAN], 3, 2).unwrap();
        let out = classify(&surface, 10.0);
        assert_eq!(out.data[..5], [0.0, 1.0, ND, 1.0, 0.0]);
        assert!(out.data[5].is_nan());
        assert_eq!(out.shape(), surface.shape());
        assert_eq!(out.nodata, surface.nodata);
    }

    #[test]
    fn threshold_above_max_flags_nothing() {
        let surface = Grid::from_cells(vec![1.0, 2.0, 3.0], 3, 1).unwrap();
        assert!(classify(&surface, 4.0).data.iter().all(|&v| v == 0.0));
        assert!(classify(&surface, 1.0).data.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn sentinel_equal_to_a_class_is_moved() {
        let mut surface = Grid::from_cells(vec![0.5, 1.0, 3.0], 3, 1).unwrap();
        surface.nodata = 1.0;
        let out = classify(&surface, 2.5);
        assert_eq!(out.value_at(0), Some(0.0));
        assert_eq!(out.value_at(1), None);
        assert_eq!(out.value_at(2), Some(1.0));
        assert_eq!(out.valid_count(), 2);

        surface.nodata = 0.5;
        let out = classify(&surface, 0.0);
        assert_eq!(out.nodata, 0.5, "a sentinel no class uses is kept");
        assert_eq!(out.valid_count(), 2);
    }

    #[test]
    fn summary_of_scenario_at_ten() {
        let surface = Grid::from_cells(vec![0.0, 10.0, 20.0, 10.0, 0.0, 20.0], 6, 1).unwrap();
        let presence = Grid::from_cells(vec![ND, ND, 1.0, 1.0, ND, ND], 6, 1).unwrap();
        let prediction = classify(&surface, 10.0);
        let s = summarize(&prediction, &presence, 10.0).unwrap();
        assert_eq!(s.area_cells, 6);
        assert_eq!(s.flagged_cells, 4);
        assert_eq!(s.flagged_fraction, 0.667);
        assert_eq!((s.site_cells, s.captured_sites), (2, 2));
        assert_eq!(s.captured_fraction, 1.0);
        assert_eq!(s.kvamme_gain, 0.333);
    }

    #[test]
    fn summary_without_sites_has_undefined_gain() {
        let surface = Grid::from_cells(vec![1.0, 2.0], 2, 1).unwrap();
        let presence = Grid::from_cells(vec![ND, ND], 2, 1).unwrap();
        let s = summarize(&classify(&surface, 2.0), &presence, 2.0).unwrap();
        assert!(s.captured_fraction.is_nan());
        assert!(s.kvamme_gain.is_nan());
    }
}
