use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::Grid;
use crate::mask;

/// One observation of the surface, labelled as site (positive) or background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledValue {
    pub value: f32,
    pub positive: bool,
}

/// Background rows for every valid surface cell, followed by one extra
/// positive row per site cell.
///
/// A site cell therefore appears twice, once as background and once as a
/// site: the sample compares the distribution of sites with the distribution
/// of the whole study area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledSample {
    rows: Vec<LabeledValue>,
    /// Presence cells that could not be scored because the surface is NoData there.
    pub dropped_sites: usize,
}

impl LabeledSample {
    /// Build from background values and site values. Non-finite values are skipped.
    pub fn from_parts<B, P>(background: B, positives: P) -> Self
    where
        B: IntoIterator<Item = f32>,
        P: IntoIterator<Item = f32>,
    {
        let negatives = background
            .into_iter()
            .map(|value| LabeledValue { value, positive: false });
        let sites = positives
            .into_iter()
            .map(|value| LabeledValue { value, positive: true });
        let rows = negatives
            .chain(sites)
            .filter(|r| r.value.is_finite())
            .collect();
        Self { rows, dropped_sites: 0 }
    }

    /// Every valid surface cell as background plus the mask-extracted site values.
    pub fn from_surface(surface: &Grid, presence: &Grid) -> Result<Self> {
        let extraction = mask::extract(surface, presence)?;
        let mut sample = Self::from_parts(surface.valid_values(), extraction.values);
        sample.dropped_sites = extraction.dropped;
        Ok(sample)
    }

    pub fn rows(&self) -> &[LabeledValue] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn positive_count(&self) -> usize {
        self.rows.iter().filter(|r| r.positive).count()
    }

    pub fn negative_count(&self) -> usize {
        self.rows.len() - self.positive_count()
    }

    /// (negatives, positives), each sorted ascending.
    pub(crate) fn sorted_partitions(&self) -> (Vec<f32>, Vec<f32>) {
        let mut neg = Vec::new();
        let mut pos = Vec::new();
        for r in &self.rows {
            if r.positive {
                pos.push(r.value);
            } else {
                neg.push(r.value);
            }
        }
        neg.sort_by(f32::total_cmp);
        pos.sort_by(f32::total_cmp);
        (neg, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DEFAULT_NODATA;

    const ND: f32 = DEFAULT_NODATA;

    #[test]
    fn site_cells_are_counted_twice() {
        let surface = Grid::from_cells(vec![0.0, 10.0, 20.0, 10.0, 0.0, 20.0], 6, 1).unwrap();
        let presence = Grid::from_cells(vec![ND, ND, 1.0, 1.0, ND, ND], 6, 1).unwrap();
        let sample = LabeledSample::from_surface(&surface, &presence).unwrap();
        assert_eq!(sample.len(), 8);
        assert_eq!(sample.negative_count(), 6);
        assert_eq!(sample.positive_count(), 2);

        let (neg, pos) = sample.sorted_partitions();
        assert_eq!(neg, vec![0.0, 0.0, 10.0, 10.0, 20.0, 20.0]);
        assert_eq!(pos, vec![10.0, 20.0]);
    }

    #[test]
    fn nodata_surface_cells_contribute_no_rows() {
        let surface = Grid::from_cells(vec![ND, 5.0, f32::NAN, 1.0], 4, 1).unwrap();
        let presence = Grid::from_cells(vec![1.0, 1.0, ND, ND], 4, 1).unwrap();
        let sample = LabeledSample::from_surface(&surface, &presence).unwrap();
        assert_eq!(sample.negative_count(), 2);
        assert_eq!(sample.positive_count(), 1);
        assert_eq!(sample.dropped_sites, 1);
    }

    #[test]
    fn from_parts_skips_non_finite_values() {
        let sample = LabeledSample::from_parts([1.0, f32::NAN, f32::INFINITY], [2.0]);
        assert_eq!(sample.negative_count(), 1);
        assert_eq!(sample.positive_count(), 1);
    }
}
