use crate::export::FileExporter;
use crate::generator::scene::SceneConfig;
use crate::gui_bridge::histogram::HistogramCollector;
use crate::gui_bridge::model::{HistogramSeries, VisualizationModel};
use crate::source::{AsciiGridSource, SyntheticSource};
use crate::workflow::config::{SourceConfig, WorkflowConfig};
use anyhow::Context;
use spillcore::interface::{FeatureExporter, RasterSource, SourceRequest, SpillReport};
use spillcore::{Crs, Pipeline, SpillDetection};
use std::path::PathBuf;

/// Number of buckets in the raw and despeckled histograms.
const HISTOGRAM_BUCKETS: usize = 100;

pub struct WorkflowResult {
    pub detection: SpillDetection,
    pub histograms: Vec<HistogramSeries>,
    pub crs: Crs,
}

impl WorkflowResult {
    pub fn report(&self) -> SpillReport {
        self.detection.report()
    }

    pub fn visualization(&self) -> VisualizationModel {
        VisualizationModel {
            report: Some(self.report()),
            histograms: self.histograms.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Fetches the configured source and runs the detection pipeline over it.
    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        match &self.config.source {
            SourceConfig::Synthetic(scene) => self.execute_with(&SyntheticSource::new(scene.clone())),
            SourceConfig::AsciiGrid { path, crs } => {
                self.execute_with(&AsciiGridSource::new(path, *crs))
            }
        }
    }

    /// Runs the pipeline over a synthetic scene instead of the configured source.
    pub fn execute_scene(&self, scene: &SceneConfig) -> anyhow::Result<WorkflowResult> {
        self.execute_with(&SyntheticSource::new(scene.clone()))
    }

    fn execute_with<S>(&self, source: &S) -> anyhow::Result<WorkflowResult>
    where
        S: RasterSource<Error = anyhow::Error>,
    {
        let roi = self.config.roi.to_region().context("building region of interest")?;
        let pipeline = Pipeline::new(self.config.pipeline.clone()).context("configuring pipeline")?;

        let request = SourceRequest {
            layer: &self.config.layer,
            time_range: self.config.time_range.as_ref(),
            roi: &roi,
        };
        let grid = source.fetch(&request).context("fetching source raster")?;
        let crs = grid.geometry().crs();

        let mut collector = HistogramCollector::new(HISTOGRAM_BUCKETS);
        let detection = pipeline
            .run_observed(&grid, &roi, &mut collector)
            .context("executing detection pipeline")?;
        drop(grid);

        Ok(WorkflowResult {
            detection,
            histograms: collector.into_series(),
            crs,
        })
    }

    /// Writes the polygons to the configured export target, if any.
    pub fn export(&self, result: &WorkflowResult) -> anyhow::Result<Option<PathBuf>> {
        let Some(target) = self.config.export.as_ref() else {
            return Ok(None);
        };
        FileExporter
            .export(&result.detection.polygons, result.crs, target)
            .with_context(|| format!("exporting polygons to {}", target.path.display()))?;
        Ok(Some(target.path.clone()))
    }
}
