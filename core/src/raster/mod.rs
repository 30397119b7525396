pub mod geometry;
pub mod grid;
pub mod mask;

pub use geometry::{Crs, Extent, GeoTransform, GridGeometry};
pub use grid::RasterGrid;
pub use mask::{BinaryMask, MASK_NODATA};
