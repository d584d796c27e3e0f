use tracing::debug;

use crate::error::{Result, SensError};
use crate::grid::Grid;

/// Elementwise sum of same-shape weight grids.
///
/// NoData is absorbing: if any input is NoData at a cell, the output cell is
/// NoData. The output uses the first grid's sentinel unless some sum equals
/// it. All grids must be aligned with the first.
pub fn sum(grids: &[Grid]) -> Result<Grid> {
    let (first, rest) = grids.split_first().ok_or(SensError::EmptyStack)?;
    for g in rest {
        first.ensure_aligned(g)?;
    }

    let cells: Vec<Option<f32>> = (0..first.len())
        .map(|i| {
            grids
                .iter()
                .try_fold(0.0f32, |acc, g| g.value_at(i).map(|v| acc + v))
        })
        .collect();

    let out = first.derive(cells);
    debug!(layers = grids.len(), cells = out.len(), nodata = out.nodata, "aggregated weight grids");
    Ok(out)
}
