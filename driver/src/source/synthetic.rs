use log::info;
use spillcore::interface::{RasterSource, SourceRequest};
use spillcore::RasterGrid;

use crate::generator::scene::{build_scene, SceneConfig};

/// Raster source backed by the synthetic scene generator.
pub struct SyntheticSource {
    scene: SceneConfig,
}

impl SyntheticSource {
    pub fn new(scene: SceneConfig) -> Self {
        Self { scene }
    }
}

impl RasterSource for SyntheticSource {
    type Error = anyhow::Error;

    fn fetch(&self, request: &SourceRequest<'_>) -> anyhow::Result<RasterGrid> {
        match request.time_range {
            Some(range) => info!(
                "synthesising layer {} for {}..{} (seed {})",
                request.layer, range.start, range.end, self.scene.seed
            ),
            None => info!(
                "synthesising layer {} (seed {})",
                request.layer, self.scene.seed
            ),
        }
        build_scene(&self.scene)
    }
}
