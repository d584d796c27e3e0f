//! Continuous grid → weight grid.

#[cfg(feature = "threading")]
use rayon::prelude::*;
use tracing::debug;

use crate::breakpoints::BreakpointTable;
use crate::error::Result;
use crate::grid::Grid;

/// Map every finite cell of `grid` through `table`.
///
/// NoData cells stay NoData. A cell that matches zero or several intervals
/// aborts with `SensError::Range`. The output keeps the input's geometry and
/// sentinel, unless the sentinel is one of the table's weights; then NoData
/// cells are written with a free sentinel so no weight is lost.
pub fn reclassify(grid: &Grid, table: &BreakpointTable) -> Result<Grid> {
    let map_cell = |&v: &f32| -> Result<Option<f32>> {
        if grid.is_nodata(v) {
            Ok(None)
        } else {
            table.weight_for(v).map(Some)
        }
    };

    #[cfg(feature = "threading")]
    let cells = grid.data.par_iter().map(map_cell).collect::<Result<Vec<_>>>()?;
    #[cfg(not(feature = "threading"))]
    let cells = grid.data.iter().map(map_cell).collect::<Result<Vec<_>>>()?;

    let out = grid.derive(cells);
    debug!(
        variable = table.variable(),
        cells = out.len(),
        classes = table.intervals().len(),
        nodata = out.nodata,
        "reclassified layer"
    );
    Ok(out)
}
