use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::prelude::{ProcessingStage, SpillError, StageResult};
use crate::raster::{BinaryMask, RasterGrid, MASK_NODATA};
use crate::telemetry::log::LogManager;

/// Comparison applied between a cell value and the cutoff.
///
/// Oil damps the capillary waves that scatter radar back to the sensor, so
/// slicks show up darker than open water and `Lt` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    #[default]
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    pub fn holds(self, value: f32, cutoff: f32) -> bool {
        match self {
            Comparator::Lt => value < cutoff,
            Comparator::Le => value <= cutoff,
            Comparator::Gt => value > cutoff,
            Comparator::Ge => value >= cutoff,
        }
    }
}

impl FromStr for Comparator {
    type Err = SpillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lt" | "<" => Ok(Self::Lt),
            "le" | "<=" => Ok(Self::Le),
            "gt" | ">" => Ok(Self::Gt),
            "ge" | ">=" => Ok(Self::Ge),
            other => Err(SpillError::InvalidParameter(format!(
                "unknown comparator '{}'",
                other
            ))),
        }
    }
}

/// Binarises a scalar grid against a fixed cutoff.
#[derive(Debug, Clone)]
pub struct Thresholder {
    cutoff: f32,
    comparator: Comparator,
    logger: LogManager,
}

impl Thresholder {
    pub fn new(cutoff: f32, comparator: Comparator) -> StageResult<Self> {
        if !cutoff.is_finite() {
            return Err(SpillError::InvalidParameter(format!(
                "threshold cutoff must be finite, got {}",
                cutoff
            )));
        }
        Ok(Self {
            cutoff,
            comparator,
            logger: LogManager::new("threshold"),
        })
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    pub fn apply(&self, grid: &RasterGrid) -> BinaryMask {
        let cells = grid.values().mapv(|v| {
            if grid.is_nodata(v) {
                MASK_NODATA
            } else {
                u8::from(self.comparator.holds(v, self.cutoff))
            }
        });
        let mask = BinaryMask::from_parts(grid.geometry().clone(), cells);
        self.logger.detail(&format!(
            "{} cells {:?} {}",
            mask.flagged_count(),
            self.comparator,
            self.cutoff
        ));
        mask
    }
}

impl ProcessingStage<RasterGrid> for Thresholder {
    type Output = BinaryMask;

    fn name(&self) -> &'static str {
        self.logger.stage()
    }

    fn execute(&self, input: &RasterGrid) -> StageResult<BinaryMask> {
        Ok(self.apply(input))
    }
}

/// Flags every valid cell of `grid` for which `comparator` holds against `cutoff`.
pub fn threshold(grid: &RasterGrid, cutoff: f32, comparator: Comparator) -> StageResult<BinaryMask> {
    Ok(Thresholder::new(cutoff, comparator)?.apply(grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{Crs, GeoTransform, GridGeometry};
    use ndarray::array;

    fn grid() -> RasterGrid {
        let geometry =
            GridGeometry::new(4, 1, GeoTransform::north_up(0.0, 0.0, 10.0), Crs::EqualArea { epsg: 6933 })
                .unwrap();
        RasterGrid::new(geometry, array![[-25.0, -22.0, -10.0, f32::NAN]], f32::NAN).unwrap()
    }

    #[test]
    fn lt_flags_strictly_below_cutoff() {
        let mask = threshold(&grid(), -22.0, Comparator::Lt).unwrap();
        assert_eq!(mask.cells(), &array![[1, 0, 0, MASK_NODATA]]);
    }

    #[test]
    fn comparators_handle_equality() {
        let le = threshold(&grid(), -22.0, Comparator::Le).unwrap();
        assert_eq!(le.cells(), &array![[1, 1, 0, MASK_NODATA]]);
        let ge = threshold(&grid(), -22.0, Comparator::Ge).unwrap();
        assert_eq!(ge.cells(), &array![[0, 1, 1, MASK_NODATA]]);
        let gt = threshold(&grid(), -22.0, Comparator::Gt).unwrap();
        assert_eq!(gt.cells(), &array![[0, 0, 1, MASK_NODATA]]);
    }

    #[test]
    fn rejects_non_finite_cutoff() {
        assert!(matches!(
            threshold(&grid(), f32::NAN, Comparator::Lt),
            Err(SpillError::InvalidParameter(_))
        ));
        assert!(Thresholder::new(f32::INFINITY, Comparator::Gt).is_err());
    }

    #[test]
    fn comparator_parses_symbols_and_names() {
        assert_eq!("<".parse::<Comparator>().unwrap(), Comparator::Lt);
        assert_eq!("GE".parse::<Comparator>().unwrap(), Comparator::Ge);
        assert!("eq".parse::<Comparator>().is_err());
    }
}
