use ndarray::Array2;

use crate::prelude::{SpillError, StageResult};
use crate::raster::geometry::GridGeometry;

/// Georeferenced scalar raster.
///
/// Values are stored row-major as `(row, col)`. A cell is no-data when it is
/// NaN or equal to the grid's sentinel.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    geometry: GridGeometry,
    values: Array2<f32>,
    nodata: f32,
}

impl RasterGrid {
    pub fn new(geometry: GridGeometry, values: Array2<f32>, nodata: f32) -> StageResult<Self> {
        if values.dim() != geometry.shape() {
            return Err(SpillError::InvalidParameter(format!(
                "values shape {:?} does not match grid shape {:?}",
                values.dim(),
                geometry.shape()
            )));
        }
        Ok(Self {
            geometry,
            values,
            nodata,
        })
    }

    /// Grid with every cell set to `value` and NaN as the no-data sentinel.
    pub fn filled(geometry: GridGeometry, value: f32) -> Self {
        let values = Array2::from_elem(geometry.shape(), value);
        Self {
            geometry,
            values,
            nodata: f32::NAN,
        }
    }

    pub fn from_fn<F>(geometry: GridGeometry, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f32,
    {
        let values = Array2::from_shape_fn(geometry.shape(), |(row, col)| f(row, col));
        Self {
            geometry,
            values,
            nodata: f32::NAN,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn nodata(&self) -> f32 {
        self.nodata
    }

    pub fn is_nodata(&self, value: f32) -> bool {
        value.is_nan() || value == self.nodata
    }

    /// Cell value, or `None` for no-data and out-of-range indices.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.values
            .get((row, col))
            .copied()
            .filter(|&v| !self.is_nodata(v))
    }

    pub fn valid_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied().filter(|&v| !self.is_nodata(v))
    }

    pub fn valid_count(&self) -> usize {
        self.valid_values().count()
    }

    /// New grid with this grid's geometry and sentinel.
    pub(crate) fn derive(&self, values: Array2<f32>) -> Self {
        debug_assert_eq!(values.dim(), self.geometry.shape());
        Self {
            geometry: self.geometry.clone(),
            values,
            nodata: self.nodata,
        }
    }
}
