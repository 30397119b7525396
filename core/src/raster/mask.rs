use ndarray::Array2;

use crate::prelude::{SpillError, StageResult};
use crate::raster::geometry::GridGeometry;

/// Cell value marking no-data in a [`BinaryMask`].
pub const MASK_NODATA: u8 = 255;

/// Raster restricted to `{0, 1, MASK_NODATA}`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    geometry: GridGeometry,
    cells: Array2<u8>,
}

impl BinaryMask {
    /// All-zero mask.
    pub fn empty(geometry: GridGeometry) -> Self {
        let cells = Array2::zeros(geometry.shape());
        Self { geometry, cells }
    }

    pub fn from_cells(geometry: GridGeometry, cells: Array2<u8>) -> StageResult<Self> {
        if cells.dim() != geometry.shape() {
            return Err(SpillError::InvalidParameter(format!(
                "mask shape {:?} does not match grid shape {:?}",
                cells.dim(),
                geometry.shape()
            )));
        }
        if let Some(bad) = cells.iter().find(|&&v| v > 1 && v != MASK_NODATA) {
            return Err(SpillError::InvalidParameter(format!(
                "mask value {} is not 0, 1 or no-data",
                bad
            )));
        }
        Ok(Self { geometry, cells })
    }

    pub(crate) fn from_parts(geometry: GridGeometry, cells: Array2<u8>) -> Self {
        debug_assert_eq!(cells.dim(), geometry.shape());
        Self { geometry, cells }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn cells(&self) -> &Array2<u8> {
        &self.cells
    }

    pub fn is_flagged(&self, row: usize, col: usize) -> bool {
        self.cells.get((row, col)) == Some(&1)
    }

    pub fn is_nodata(&self, row: usize, col: usize) -> bool {
        self.cells.get((row, col)) == Some(&MASK_NODATA)
    }

    pub fn flagged_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == 1).count()
    }

    pub fn flagged_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .indexed_iter()
            .filter(|(_, v)| **v == 1)
            .map(|(idx, _)| idx)
    }
}
