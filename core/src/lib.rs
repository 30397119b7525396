//! Core raster anomaly-detection pipeline for radar oil-spill screening.
//!
//! The modules follow the legacy despeckle / threshold / mask / integrate /
//! vectorize chain, but every stage evaluates eagerly over in-memory grids and
//! receives its inputs explicitly instead of reading shared map state.

pub mod interface;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod raster;
pub mod roi;
pub mod telemetry;

pub use pipeline::{Pipeline, PipelineConfig, SpillDetection};
pub use prelude::{ProcessingStage, SpillError, StageResult};
pub use raster::{BinaryMask, Crs, GeoTransform, GridGeometry, RasterGrid};
pub use roi::RegionOfInterest;
