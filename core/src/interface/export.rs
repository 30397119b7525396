use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::processing::vectorize::PolygonFeature;
use crate::raster::Crs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    GeoJson,
    Wkt,
}

/// Destination for an exported feature set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTarget {
    #[serde(default)]
    pub format: ExportFormat,
    pub path: PathBuf,
}

/// Serialises vectorised anomalies; the format is opaque to the core.
pub trait FeatureExporter {
    type Error;

    fn export(
        &self,
        features: &[PolygonFeature],
        crs: Crs,
        target: &ExportTarget,
    ) -> Result<(), Self::Error>;
}
