pub mod geojson;
pub mod wkt;

use anyhow::Context;
use log::info;
use spillcore::interface::{ExportFormat, ExportTarget, FeatureExporter};
use spillcore::processing::PolygonFeature;
use spillcore::Crs;
use std::fs;

/// Writes feature sets to local files in the target's format.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExporter;

impl FeatureExporter for FileExporter {
    type Error = anyhow::Error;

    fn export(
        &self,
        features: &[PolygonFeature],
        crs: Crs,
        target: &ExportTarget,
    ) -> anyhow::Result<()> {
        let body = match target.format {
            ExportFormat::GeoJson => {
                let collection = geojson::feature_collection(features, crs);
                serde_json::to_string_pretty(&collection).context("serialising GeoJSON")?
            }
            ExportFormat::Wkt => wkt::to_wkt_lines(features),
        };
        if let Some(parent) = target.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        fs::write(&target.path, body)
            .with_context(|| format!("writing {}", target.path.display()))?;
        info!(
            "exported {} polygons as {:?} to {}",
            features.len(),
            target.format,
            target.path.display()
        );
        Ok(())
    }
}
