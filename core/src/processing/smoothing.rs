use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::prelude::{ProcessingStage, SpillError, StageResult};
use crate::raster::{GridGeometry, RasterGrid};
use crate::telemetry::log::LogManager;

/// Tolerance for radii that are an exact multiple of the cell size.
const RADIUS_EPSILON: f64 = 1e-9;

/// Footprint of the moving window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowShape {
    #[default]
    Square,
    Circle,
}

impl FromStr for WindowShape {
    type Err = SpillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "square" => Ok(Self::Square),
            "circle" => Ok(Self::Circle),
            other => Err(SpillError::InvalidParameter(format!(
                "unknown window shape '{}'",
                other
            ))),
        }
    }
}

/// Pixel footprint of a window: for each row offset `-half_height..=half_height`
/// the number of columns covered on either side of the centre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    half_height: usize,
    half_widths: Vec<usize>,
}

impl Window {
    pub fn half_height(&self) -> usize {
        self.half_height
    }

    /// Half width for row offset `dy`.
    pub fn half_width(&self, dy: isize) -> usize {
        self.half_widths[(dy + self.half_height as isize) as usize]
    }

    pub fn cell_count(&self) -> usize {
        self.half_widths.iter().map(|w| 2 * w + 1).sum()
    }
}

/// Moving-window mean filter used for despeckling.
///
/// The radius is given in metres on the ground so the footprint does not
/// depend on the source resolution. Border cells use a truncated window and
/// no-data cells are left out of every mean.
#[derive(Debug, Clone)]
pub struct Smoother {
    radius_m: f64,
    shape: WindowShape,
    logger: LogManager,
}

impl Smoother {
    pub fn new(radius_m: f64, shape: WindowShape) -> StageResult<Self> {
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(SpillError::InvalidParameter(format!(
                "smoothing radius must be positive and finite, got {}",
                radius_m
            )));
        }
        Ok(Self {
            radius_m,
            shape,
            logger: LogManager::new("smooth"),
        })
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn shape(&self) -> WindowShape {
        self.shape
    }

    /// Converts the ground radius into a pixel window for `geometry`.
    ///
    /// Half-widths are capped at the grid size; a window reaching past every
    /// edge covers the whole grid either way.
    pub fn window_for(&self, geometry: &GridGeometry) -> StageResult<Window> {
        let (cell_x, cell_y) = geometry.ground_cell_size();
        let span_x = (self.radius_m / cell_x + RADIUS_EPSILON).floor();
        let span_y = (self.radius_m / cell_y + RADIUS_EPSILON).floor();
        if !(span_x >= 1.0 && span_y >= 1.0) {
            return Err(SpillError::InvalidParameter(format!(
                "radius {} m covers less than one pixel of {:.2} x {:.2} m cells",
                self.radius_m, cell_x, cell_y
            )));
        }
        let (rows, cols) = geometry.shape();
        let half_width = capped_span(span_x, cols);
        let half_height = capped_span(span_y, rows);

        let half_widths = (-(half_height as isize)..=half_height as isize)
            .map(|dy| match self.shape {
                WindowShape::Square => half_width,
                WindowShape::Circle => {
                    let offset = dy as f64 * cell_y;
                    let reach = (self.radius_m * self.radius_m - offset * offset).max(0.0);
                    capped_span((reach.sqrt() / cell_x + RADIUS_EPSILON).floor(), cols)
                }
            })
            .collect();

        Ok(Window {
            half_height,
            half_widths,
        })
    }

    pub fn apply(&self, grid: &RasterGrid) -> StageResult<RasterGrid> {
        let window = self.window_for(grid.geometry())?;
        let (rows, cols) = grid.geometry().shape();
        let stride = cols + 1;

        // Row-wise prefix sums of valid values and valid counts.
        let mut sums = vec![0.0f64; rows * stride];
        let mut counts = vec![0u32; rows * stride];
        for (row, line) in grid.values().outer_iter().enumerate() {
            let base = row * stride;
            for (col, &value) in line.iter().enumerate() {
                let valid = !grid.is_nodata(value);
                sums[base + col + 1] = sums[base + col] + if valid { f64::from(value) } else { 0.0 };
                counts[base + col + 1] = counts[base + col] + u32::from(valid);
            }
        }

        let reach = window.half_height() as isize;
        let nodata = grid.nodata();
        let values = Array2::from_shape_fn((rows, cols), |(row, col)| {
            let mut sum = 0.0;
            let mut count = 0u32;
            for dy in -reach..=reach {
                let r = row as isize + dy;
                if r < 0 || r >= rows as isize {
                    continue;
                }
                let half = window.half_width(dy);
                let lo = col.saturating_sub(half);
                let hi = (col + half + 1).min(cols);
                let base = r as usize * stride;
                sum += sums[base + hi] - sums[base + lo];
                count += counts[base + hi] - counts[base + lo];
            }
            if count == 0 {
                nodata
            } else {
                (sum / f64::from(count)) as f32
            }
        });

        self.logger.detail(&format!(
            "{:?} window {} cells ({} m) over {}x{} grid",
            self.shape,
            window.cell_count(),
            self.radius_m,
            cols,
            rows
        ));
        Ok(grid.derive(values))
    }
}

/// Whole-pixel span limited to `cells - 1`.
fn capped_span(span: f64, cells: usize) -> usize {
    let limit = cells.saturating_sub(1);
    if span >= limit as f64 {
        limit
    } else {
        span as usize
    }
}

impl ProcessingStage<RasterGrid> for Smoother {
    type Output = RasterGrid;

    fn name(&self) -> &'static str {
        self.logger.stage()
    }

    fn execute(&self, input: &RasterGrid) -> StageResult<RasterGrid> {
        self.apply(input)
    }
}

/// Mean-filters `grid` with a window of `radius_m` metres.
pub fn smooth(grid: &RasterGrid, radius_m: f64, shape: WindowShape) -> StageResult<RasterGrid> {
    Smoother::new(radius_m, shape)?.apply(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{Crs, GeoTransform};
    use ndarray::array;

    fn geometry(rows: usize, cols: usize) -> GridGeometry {
        GridGeometry::new(cols, rows, GeoTransform::north_up(0.0, 0.0, 10.0), Crs::EqualArea { epsg: 6933 })
            .unwrap()
    }

    fn grid(values: Array2<f32>) -> RasterGrid {
        let (rows, cols) = values.dim();
        RasterGrid::new(geometry(rows, cols), values, f32::NAN).unwrap()
    }

    #[test]
    fn rejects_non_positive_and_sub_pixel_radii() {
        assert!(Smoother::new(0.0, WindowShape::Square).is_err());
        assert!(Smoother::new(-5.0, WindowShape::Square).is_err());
        assert!(Smoother::new(f64::NAN, WindowShape::Circle).is_err());
        let g = RasterGrid::filled(geometry(3, 3), 1.0);
        assert!(matches!(
            smooth(&g, 9.0, WindowShape::Square),
            Err(SpillError::InvalidParameter(_))
        ));
    }

    #[test]
    fn window_size_follows_ground_radius() {
        let smoother = Smoother::new(25.0, WindowShape::Square).unwrap();
        let window = smoother.window_for(&geometry(10, 10)).unwrap();
        assert_eq!(window.half_height(), 2);
        assert_eq!(window.cell_count(), 25);

        let circle = Smoother::new(20.0, WindowShape::Circle).unwrap();
        let window = circle.window_for(&geometry(10, 10)).unwrap();
        // 2-pixel disc: rows of width 1, 3, 5, 3, 1.
        assert_eq!(window.cell_count(), 13);
        assert_eq!(window.half_width(-2), 0);
        assert_eq!(window.half_width(1), 1);
    }

    #[test]
    fn interior_cell_gets_full_window_mean() {
        let g = grid(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let out = smooth(&g, 10.0, WindowShape::Square).unwrap();
        assert_eq!(out.get(1, 1), Some(5.0));
        // Corner windows are truncated to the 2x2 block inside the grid.
        assert_eq!(out.get(0, 0), Some(3.0));
        assert_eq!(out.get(2, 2), Some(7.0));
        assert_eq!(out.geometry(), g.geometry());
    }

    #[test]
    fn nodata_is_skipped_and_only_survives_in_empty_windows() {
        let nan = f32::NAN;
        let g = grid(array![
            [nan, nan, nan, nan, 2.0],
            [nan, nan, nan, nan, 4.0],
            [nan, nan, nan, nan, nan]
        ]);
        let out = smooth(&g, 10.0, WindowShape::Square).unwrap();
        assert_eq!(out.get(0, 0), None);
        assert_eq!(out.get(2, 1), None);
        assert_eq!(out.get(0, 3), Some(3.0));
        assert_eq!(out.get(2, 4), Some(4.0));
        assert_eq!(out.get(1, 4), Some(3.0));
    }

    #[test]
    fn oversized_radius_averages_the_whole_grid() {
        let g = grid(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        for radius in [1e8, 1e20, f64::MAX] {
            for shape in [WindowShape::Square, WindowShape::Circle] {
                let window = Smoother::new(radius, shape).unwrap().window_for(g.geometry()).unwrap();
                assert_eq!(window.half_height(), 2);
                let out = smooth(&g, radius, shape).unwrap();
                assert_eq!(out.valid_count(), 9);
                for value in out.valid_values() {
                    assert_eq!(value, 5.0);
                }
            }
        }
    }

    #[test]
    fn shape_parses_case_insensitively() {
        assert_eq!("Circle".parse::<WindowShape>().unwrap(), WindowShape::Circle);
        assert!("hexagon".parse::<WindowShape>().is_err());
    }
}
