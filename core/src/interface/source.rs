use serde::{Deserialize, Serialize};

use crate::raster::RasterGrid;
use crate::roi::RegionOfInterest;

/// Inclusive acquisition window, as ISO-8601 dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// What the pipeline asks a raster source for.
#[derive(Debug, Clone, Copy)]
pub struct SourceRequest<'a> {
    pub layer: &'a str,
    pub time_range: Option<&'a TimeRange>,
    pub roi: &'a RegionOfInterest,
}

/// Supplies the backscatter grid covering a request.
///
/// Scene selection and mosaicking belong to the implementor; the core only
/// needs a grid with a defined cell size, CRS and no-data convention.
pub trait RasterSource {
    type Error;

    fn fetch(&self, request: &SourceRequest<'_>) -> Result<RasterGrid, Self::Error>;
}
