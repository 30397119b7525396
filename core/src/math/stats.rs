use serde::{Deserialize, Serialize};

use crate::prelude::{SpillError, StageResult};
use crate::raster::RasterGrid;

/// Neumaier-compensated accumulator for long sums of positive terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Value range and central tendency over the valid cells of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSummary {
    pub valid_cells: usize,
    pub nodata_cells: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl GridSummary {
    pub fn from_grid(grid: &RasterGrid) -> Self {
        let mut valid_cells = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = CompensatedSum::new();
        for value in grid.valid_values() {
            let value = f64::from(value);
            valid_cells += 1;
            min = min.min(value);
            max = max.max(value);
            sum.add(value);
        }
        if valid_cells == 0 {
            return Self {
                valid_cells,
                nodata_cells: grid.geometry().cell_count(),
                min: 0.0,
                max: 0.0,
                mean: 0.0,
            };
        }
        Self {
            valid_cells,
            nodata_cells: grid.geometry().cell_count() - valid_cells,
            min,
            max,
            mean: sum.total() / valid_cells as f64,
        }
    }
}

/// Fixed-bucket histogram of the valid cells of a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn from_grid(grid: &RasterGrid, buckets: usize) -> StageResult<Self> {
        if buckets == 0 {
            return Err(SpillError::InvalidParameter(
                "histogram needs at least one bucket".into(),
            ));
        }
        let summary = GridSummary::from_grid(grid);
        let mut counts = vec![0u64; buckets];
        if summary.valid_cells == 0 {
            return Ok(Self {
                min: 0.0,
                max: 0.0,
                counts,
            });
        }

        let span = summary.max - summary.min;
        for value in grid.valid_values() {
            let idx = if span > 0.0 {
                let scaled = (f64::from(value) - summary.min) / span * buckets as f64;
                (scaled as usize).min(buckets - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }

        Ok(Self {
            min: summary.min,
            max: summary.max,
            counts,
        })
    }

    pub fn bucket_width(&self) -> f64 {
        if self.counts.is_empty() {
            0.0
        } else {
            (self.max - self.min) / self.counts.len() as f64
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{Crs, GeoTransform, GridGeometry};
    use ndarray::array;

    fn grid(values: ndarray::Array2<f32>) -> RasterGrid {
        let (rows, cols) = values.dim();
        let geometry = GridGeometry::new(
            cols,
            rows,
            GeoTransform::north_up(0.0, 0.0, 10.0),
            Crs::EqualArea { epsg: 6933 },
        )
        .unwrap();
        RasterGrid::new(geometry, values, f32::NAN).unwrap()
    }

    #[test]
    fn compensated_sum_keeps_small_terms() {
        let mut sum = CompensatedSum::new();
        sum.add(1e16);
        for _ in 0..10 {
            sum.add(1.0);
        }
        assert_eq!(sum.total(), 1e16 + 10.0);
    }

    #[test]
    fn summary_ignores_nodata() {
        let summary = GridSummary::from_grid(&grid(array![[1.0, f32::NAN], [3.0, 5.0]]));
        assert_eq!(summary.valid_cells, 3);
        assert_eq!(summary.nodata_cells, 1);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 5.0);
        assert_eq!(summary.mean, 3.0);
    }

    #[test]
    fn histogram_places_extremes_in_outer_buckets() {
        let hist = Histogram::from_grid(&grid(array![[-30.0, -20.0], [-10.0, 0.0]]), 3).unwrap();
        assert_eq!(hist.counts, vec![1, 1, 2]);
        assert_eq!(hist.total(), 4);
        assert_eq!(hist.bucket_width(), 10.0);
    }

    #[test]
    fn histogram_rejects_zero_buckets() {
        assert!(Histogram::from_grid(&grid(array![[0.0]]), 0).is_err());
    }
}
