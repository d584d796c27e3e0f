use serde::{Deserialize, Serialize};

use crate::error::{Result, SensError};

/// NoData sentinel used when a caller does not declare one.
pub const DEFAULT_NODATA: f32 = -9999.0;

/// Relative tolerance when comparing two extents for alignment.
const EXTENT_EPS: f64 = 1e-9;

/// Geographic bounds of a grid. Coordinate math uses f64.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self { min_x, max_x, min_y, max_y }
    }

    /// Pixel-space extent: one unit per cell.
    pub fn unit(width: usize, height: usize) -> Self {
        Self::new(0.0, width as f64, 0.0, height as f64)
    }

    fn close_to(&self, other: &Extent) -> bool {
        let span = (self.max_x - self.min_x)
            .abs()
            .max((self.max_y - self.min_y).abs())
            .max(1.0);
        let tol = span * EXTENT_EPS;
        (self.min_x - other.min_x).abs() <= tol
            && (self.max_x - other.max_x).abs() <= tol
            && (self.min_y - other.min_y).abs() <= tol
            && (self.max_y - other.max_y).abs() <= tol
    }
}

/// Dimensions and cell-to-coordinate mapping shared by every grid in a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridShape {
    pub width: usize,
    pub height: usize,
    pub extent: Extent,
}

impl GridShape {
    pub fn aligned_with(&self, other: &GridShape) -> bool {
        self.width == other.width && self.height == other.height && self.extent.close_to(&other.extent)
    }
}

impl std::fmt::Display for GridShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let e = &self.extent;
        write!(
            f,
            "{}x{} [{}, {}] x [{}, {}]",
            self.width, self.height, e.min_x, e.max_x, e.min_y, e.max_y
        )
    }
}

fn null_as_nan_vec<'de, D: serde::Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<f32>, D::Error> {
    let v: Vec<Option<f32>> = Vec::deserialize(d)?;
    Ok(v.into_iter().map(|x| x.unwrap_or(f32::NAN)).collect())
}

/// Wire form of [`Grid`]; converted through [`Grid::from_vec`] so a file whose
/// data length disagrees with its dimensions is rejected on load.
#[derive(Deserialize)]
struct RawGrid {
    #[serde(deserialize_with = "null_as_nan_vec")]
    data: Vec<f32>,
    width: usize,
    height: usize,
    extent: Extent,
    nodata: f32,
}

impl TryFrom<RawGrid> for Grid {
    type Error = SensError;

    fn try_from(raw: RawGrid) -> Result<Self> {
        Grid::from_vec(raw.data, raw.width, raw.height, raw.extent, raw.nodata)
    }
}

/// A dense raster of f32 cell values, row-major, row 0 = southern edge.
///
/// A cell is NoData when it equals `nodata` or is not finite. Stages never
/// mutate a grid they were handed; each returns a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub extent: Extent,
    pub nodata: f32,
}

impl Grid {
    /// Create a grid filled with `fill`.
    pub fn new(width: usize, height: usize, extent: Extent, nodata: f32, fill: f32) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
            extent,
            nodata,
        }
    }

    /// Wrap existing row-major data. Fails if `data` does not hold `width × height` cells.
    pub fn from_vec(data: Vec<f32>, width: usize, height: usize, extent: Extent, nodata: f32) -> Result<Self> {
        if data.len() != width * height {
            return Err(SensError::DataLength {
                expected: width * height,
                found: data.len(),
            });
        }
        Ok(Self { data, width, height, extent, nodata })
    }

    /// Pixel-space grid with the default NoData sentinel.
    pub fn from_cells(data: Vec<f32>, width: usize, height: usize) -> Result<Self> {
        Self::from_vec(data, width, height, Extent::unit(width, height), DEFAULT_NODATA)
    }

    /// Stage output on the geometry of `self`: `Some` for valid cells, `None`
    /// for NoData.
    ///
    /// NoData cells keep a non-finite input value as is and otherwise get the
    /// output sentinel. That sentinel is `self.nodata` unless some valid output
    /// equals it, in which case the first free value from
    /// [`DEFAULT_NODATA`], `f32::MIN`, `DEFAULT_NODATA - 1`, ... is used.
    pub(crate) fn derive(&self, cells: Vec<Option<f32>>) -> Self {
        debug_assert_eq!(cells.len(), self.data.len());
        let nodata = free_sentinel(self.nodata, &cells);
        let data = cells
            .into_iter()
            .zip(&self.data)
            .map(|(cell, &input)| match cell {
                Some(v) => v,
                None if !input.is_finite() => input,
                None => nodata,
            })
            .collect();
        Self {
            data,
            width: self.width,
            height: self.height,
            extent: self.extent,
            nodata,
        }
    }

    pub fn shape(&self) -> GridShape {
        GridShape {
            width: self.width,
            height: self.height,
            extent: self.extent,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fail with `ShapeMismatch` unless `other` shares dimensions and extent.
    pub fn ensure_aligned(&self, other: &Grid) -> Result<()> {
        let (a, b) = (self.shape(), other.shape());
        if a.aligned_with(&b) {
            Ok(())
        } else {
            Err(SensError::ShapeMismatch { expected: a, found: b })
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.data[row * self.width + col] = val;
    }

    #[inline]
    pub fn is_nodata(&self, v: f32) -> bool {
        !v.is_finite() || v == self.nodata
    }

    /// The value at a flat index, or None for NoData.
    #[inline]
    pub fn value_at(&self, idx: usize) -> Option<f32> {
        let v = self.data[idx];
        if self.is_nodata(v) {
            None
        } else {
            Some(v)
        }
    }

    /// Iterator over valid (non-NoData) values in row-major order.
    pub fn valid_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.data.iter().copied().filter(move |&v| !self.is_nodata(v))
    }

    pub fn valid_count(&self) -> usize {
        self.valid_values().count()
    }

    /// Smallest valid value, None if every cell is NoData.
    pub fn min_value(&self) -> Option<f32> {
        self.valid_values().reduce(f32::min)
    }

    /// Largest valid value, None if every cell is NoData.
    pub fn max_value(&self) -> Option<f32> {
        self.valid_values().reduce(f32::max)
    }

    pub fn cell_width(&self) -> f64 {
        (self.extent.max_x - self.extent.min_x) / self.width as f64
    }

    pub fn cell_height(&self) -> f64 {
        (self.extent.max_y - self.extent.min_y) / self.height as f64
    }

    /// The (row, col) containing (x, y), or None outside the extent.
    /// Points on the max edges belong to the last row/column.
    pub fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let e = &self.extent;
        if self.width == 0 || self.height == 0 {
            return None;
        }
        if !(x >= e.min_x && x <= e.max_x && y >= e.min_y && y <= e.max_y) {
            return None;
        }
        let col = (((x - e.min_x) / self.cell_width()).floor() as usize).min(self.width - 1);
        let row = (((y - e.min_y) / self.cell_height()).floor() as usize).min(self.height - 1);
        Some((row, col))
    }

    /// Coordinates of the centre of cell (row, col).
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let x = self.extent.min_x + (col as f64 + 0.5) * self.cell_width();
        let y = self.extent.min_y + (row as f64 + 0.5) * self.cell_height();
        (x, y)
    }
}

/// First candidate sentinel no valid cell takes.
fn free_sentinel(preferred: f32, cells: &[Option<f32>]) -> f32 {
    let taken = |s: f32| cells.iter().any(|&c| c == Some(s));
    if !taken(preferred) {
        return preferred;
    }
    [DEFAULT_NODATA, f32::MIN]
        .into_iter()
        .chain((1..=cells.len()).map(|k| DEFAULT_NODATA - k as f32))
        .find(|&s| !taken(s))
        .unwrap_or(f32::NAN)
}
