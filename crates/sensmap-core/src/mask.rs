//! Presence masks: known site locations aligned to the sensitivity surface.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::grid::Grid;

/// Value burned into presence-mask cells.
pub const PRESENT: f32 = 1.0;

/// A known site location in the grid's coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SitePoint {
    pub x: f64,
    pub y: f64,
}

/// Surface values under the mask, plus how many mask cells could not be scored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositiveExtraction {
    /// Row-major surface values at mask cells.
    pub values: Vec<f32>,
    /// Mask cells whose surface cell is NoData.
    pub dropped: usize,
}

/// Surface value of every cell where `mask` is not NoData, in row-major order.
///
/// An all-NoData mask yields an empty vector. Mask cells over NoData surface
/// cells are skipped.
pub fn extract_positives(surface: &Grid, mask: &Grid) -> Result<Vec<f32>> {
    Ok(extract(surface, mask)?.values)
}

/// Like [`extract_positives`], also counting the mask cells that were dropped.
pub fn extract(surface: &Grid, mask: &Grid) -> Result<PositiveExtraction> {
    surface.ensure_aligned(mask)?;

    let mut out = PositiveExtraction::default();
    for idx in 0..mask.len() {
        if mask.value_at(idx).is_none() {
            continue;
        }
        match surface.value_at(idx) {
            Some(v) => out.values.push(v),
            None => out.dropped += 1,
        }
    }

    if out.dropped > 0 {
        warn!(dropped = out.dropped, "presence cells fall on NoData surface cells and were skipped");
    }
    debug!(positives = out.values.len(), "extracted presence values");
    Ok(out)
}

/// Result of burning site points into a mask.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedSites {
    pub mask: Grid,
    /// Number of distinct cells marked present.
    pub cells: usize,
    /// Points that fell outside the template extent.
    pub outside: usize,
}

/// Burn `points` into a presence mask aligned to `template`.
///
/// Cells containing at least one point get [`PRESENT`]; every other cell is
/// NoData. Several points in one cell mark it once.
pub fn rasterize_points(template: &Grid, points: &[SitePoint]) -> RasterizedSites {
    let mut burned: Vec<Option<f32>> = vec![None; template.len()];
    let mut cells = 0usize;
    let mut outside = 0usize;

    for p in points {
        match template.cell_of(p.x, p.y) {
            Some((row, col)) => {
                let cell = &mut burned[row * template.width + col];
                if cell.is_none() {
                    *cell = Some(PRESENT);
                    cells += 1;
                }
            }
            None => outside += 1,
        }
    }
    let mask = template.derive(burned);

    if outside > 0 {
        warn!(outside, total = points.len(), "site points outside the grid extent were ignored");
    }
    RasterizedSites { mask, cells, outside }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensError;
    use crate::grid::{Extent, DEFAULT_NODATA};

    const ND: f32 = DEFAULT_NODATA;

    #[test]
    fn extracts_values_under_mask_in_row_major_order() {
        let surface = Grid::from_cells(vec![0.0, 10.0, 20.0, 10.0, 0.0, 20.0], 3, 2).unwrap();
        let mask = Grid::from_cells(vec![ND, ND, 1.0, 1.0, ND, ND], 3, 2).unwrap();
        assert_eq!(extract_positives(&surface, &mask).unwrap(), vec![20.0, 10.0]);
    }

    #[test]
    fn any_non_nodata_mask_value_counts_as_present() {
        let surface = Grid::from_cells(vec![1.0, 2.0, 3.0], 3, 1).unwrap();
        let mask = Grid::from_cells(vec![0.0, 7.0, f32::NAN], 3, 1).unwrap();
        assert_eq!(extract_positives(&surface, &mask).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn empty_mask_is_not_an_error() {
        let surface = Grid::from_cells(vec![1.0, 2.0], 2, 1).unwrap();
        let mask = Grid::from_cells(vec![ND, ND], 2, 1).unwrap();
        assert!(extract_positives(&surface, &mask).unwrap().is_empty());
    }

    #[test]
    fn sites_on_nodata_surface_are_dropped_and_counted() {
        let surface = Grid::from_cells(vec![ND, 2.0, 3.0], 3, 1).unwrap();
        let mask = Grid::from_cells(vec![1.0, 1.0, ND], 3, 1).unwrap();
        let ex = extract(&surface, &mask).unwrap();
        assert_eq!(ex.values, vec![2.0]);
        assert_eq!(ex.dropped, 1);
    }

    #[test]
    fn misaligned_mask_is_fatal() {
        let surface = Grid::from_cells(vec![1.0; 4], 2, 2).unwrap();
        let mask = Grid::from_cells(vec![1.0; 4], 1, 4).unwrap();
        assert!(matches!(extract(&surface, &mask), Err(SensError::ShapeMismatch { .. })));
    }

    #[test]
    fn rasterize_survives_template_sentinel_of_one() {
        let mut template = Grid::from_cells(vec![0.0; 4], 4, 1).unwrap();
        template.nodata = PRESENT;
        let r = rasterize_points(&template, &[SitePoint { x: 1.5, y: 0.5 }, SitePoint { x: 3.5, y: 0.5 }]);
        assert_eq!(r.cells, 2);
        assert_ne!(r.mask.nodata, PRESENT);
        assert_eq!(r.mask.valid_count(), 2);
        assert_eq!(r.mask.value_at(1), Some(PRESENT));
    }

    #[test]
    fn rasterize_marks_cells_once_and_counts_outside() {
        let template = Grid::new(4, 4, Extent::new(0.0, 400.0, 0.0, 400.0), ND, 0.0);
        let points = [
            SitePoint { x: 50.0, y: 50.0 },
            SitePoint { x: 60.0, y: 70.0 },
            SitePoint { x: 350.0, y: 150.0 },
            SitePoint { x: 500.0, y: 10.0 },
        ];
        let r = rasterize_points(&template, &points);
        assert_eq!(r.cells, 2);
        assert_eq!(r.outside, 1);
        assert_eq!(r.mask.get(0, 0), PRESENT);
        assert_eq!(r.mask.get(1, 3), PRESENT);
        assert_eq!(r.mask.valid_count(), 2);
        assert_eq!(r.mask.shape(), template.shape());
    }
}
