pub mod geodesy;
pub mod polygon;
pub mod stats;

pub use polygon::Coord;
pub use stats::{CompensatedSum, GridSummary, Histogram};
