use serde::{Deserialize, Serialize};

use crate::math::stats::CompensatedSum;
use crate::prelude::{ProcessingStage, SpillError, StageResult};
use crate::raster::BinaryMask;
use crate::roi::RegionOfInterest;
use crate::telemetry::log::LogManager;

/// Ground area in square metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AreaResult {
    square_metres: f64,
}

impl AreaResult {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn square_metres(&self) -> f64 {
        self.square_metres
    }

    pub fn square_kilometres(&self) -> f64 {
        self.square_metres / 1e6
    }
}

/// Integrates the true ground area of flagged cells inside a region.
#[derive(Debug, Clone)]
pub struct AreaEstimator {
    logger: LogManager,
}

impl AreaEstimator {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("area"),
        }
    }

    /// Sums per-cell ground area over flagged cells whose centre lies in `roi`.
    ///
    /// Fails with `InvalidGeometry` when the region does not overlap the mask
    /// or uses a different CRS.
    pub fn estimate(&self, mask: &BinaryMask, roi: &RegionOfInterest) -> StageResult<AreaResult> {
        let inside = roi.membership(mask.geometry())?;
        if mask.flagged_count() == 0 {
            return Ok(AreaResult::zero());
        }

        let geometry = mask.geometry();
        let mut total = CompensatedSum::new();
        let mut counted = 0usize;
        for (row, col) in mask.flagged_cells() {
            if inside[[row, col]] {
                total.add(geometry.cell_area(row, col));
                counted += 1;
            }
        }

        let square_metres = total.total();
        if !square_metres.is_finite() || square_metres < 0.0 {
            return Err(SpillError::Internal(format!(
                "area accumulated to {}",
                square_metres
            )));
        }
        self.logger
            .detail(&format!("{} cells -> {:.2} m2", counted, square_metres));
        Ok(AreaResult { square_metres })
    }
}

impl Default for AreaEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage<(BinaryMask, RegionOfInterest)> for AreaEstimator {
    type Output = AreaResult;

    fn name(&self) -> &'static str {
        self.logger.stage()
    }

    fn execute(&self, input: &(BinaryMask, RegionOfInterest)) -> StageResult<AreaResult> {
        self.estimate(&input.0, &input.1)
    }
}

/// Ground area of the flagged cells of `mask` that fall inside `roi`.
pub fn estimate_area(mask: &BinaryMask, roi: &RegionOfInterest) -> StageResult<AreaResult> {
    AreaEstimator::new().estimate(mask, roi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::geodesy;
    use crate::raster::{Crs, GeoTransform, GridGeometry};
    use ndarray::Array2;

    fn planar() -> GridGeometry {
        GridGeometry::new(5, 5, GeoTransform::north_up(0.0, 50.0, 10.0), Crs::EqualArea { epsg: 6933 })
            .unwrap()
    }

    fn mask_with(geometry: GridGeometry, flagged: &[(usize, usize)]) -> BinaryMask {
        let mut cells = Array2::zeros(geometry.shape());
        for &(r, c) in flagged {
            cells[[r, c]] = 1;
        }
        BinaryMask::from_cells(geometry, cells).unwrap()
    }

    #[test]
    fn empty_mask_has_exactly_zero_area() {
        let geometry = planar();
        let roi = RegionOfInterest::from_extent(&geometry);
        let area = estimate_area(&BinaryMask::empty(geometry), &roi).unwrap();
        assert_eq!(area.square_metres(), 0.0);
    }

    #[test]
    fn only_cells_inside_the_region_count() {
        let geometry = planar();
        let mask = mask_with(geometry.clone(), &[(0, 0), (0, 1), (4, 4)]);
        let roi = RegionOfInterest::rectangle(0.0, 30.0, 30.0, 50.0, geometry.crs()).unwrap();
        let area = estimate_area(&mask, &roi).unwrap();
        assert_eq!(area.square_metres(), 200.0);
    }

    #[test]
    fn flipping_a_cell_never_decreases_area() {
        let geometry = planar();
        let roi = RegionOfInterest::from_extent(&geometry);
        let mut flagged = vec![(1, 1)];
        let mut previous = estimate_area(&mask_with(geometry.clone(), &flagged), &roi).unwrap();
        for cell in [(2, 2), (0, 4), (4, 0)] {
            flagged.push(cell);
            let next = estimate_area(&mask_with(geometry.clone(), &flagged), &roi).unwrap();
            assert!(next.square_metres() >= previous.square_metres());
            previous = next;
        }
    }

    #[test]
    fn geographic_cells_use_ellipsoidal_area() {
        let geometry =
            GridGeometry::new(2, 2, GeoTransform::north_up(-57.0, 6.0, 0.001), Crs::Geographic).unwrap();
        let mask = mask_with(geometry.clone(), &[(0, 0), (1, 1)]);
        let roi = RegionOfInterest::from_extent(&geometry);
        let area = estimate_area(&mask, &roi).unwrap();
        let expected = geodesy::quadrangle_area(0.001, 5.999, 6.0)
            + geodesy::quadrangle_area(0.001, 5.998, 5.999);
        assert!((area.square_metres() - expected).abs() < 1e-6);
        // About 110.7 m x 110.6 m per cell at 6 degrees north.
        assert!((area.square_metres() / 2.0 - 12_245.0).abs() < 50.0);
    }

    #[test]
    fn disjoint_region_is_invalid_geometry() {
        let geometry = planar();
        let roi = RegionOfInterest::rectangle(1_000.0, 1_000.0, 2_000.0, 2_000.0, geometry.crs()).unwrap();
        let result = estimate_area(&BinaryMask::empty(geometry), &roi);
        assert!(matches!(result, Err(SpillError::InvalidGeometry(_))));
    }
}
