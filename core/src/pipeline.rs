//! Clip → smooth → threshold → (area, vectorize) orchestration.

use serde::{Deserialize, Serialize};

use crate::interface::observer::{GridObserver, NoopObserver, ObservedStage};
use crate::interface::report::SpillReport;
use crate::prelude::{ProcessingStage, StageResult};
use crate::processing::{
    Adjacency, AreaEstimator, AreaResult, Comparator, PolygonFeature, Smoother, Thresholder,
    Vectorizer, WindowShape,
};
use crate::raster::{BinaryMask, RasterGrid};
use crate::roi::RegionOfInterest;
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::StageTimings;

/// Stage parameters for one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub smooth_radius_m: f64,
    pub window: WindowShape,
    pub cutoff: f32,
    pub comparator: Comparator,
    pub adjacency: Adjacency,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            smooth_radius_m: 100.0,
            window: WindowShape::Square,
            cutoff: -22.0,
            comparator: Comparator::Lt,
            adjacency: Adjacency::Four,
        }
    }
}

/// Output of one run.
///
/// Equality compares the mask, area and polygons only. Repeated runs over the
/// same inputs compare equal even though their wall-clock timings differ.
#[derive(Debug, Clone)]
pub struct SpillDetection {
    /// Anomaly mask restricted to the region; cells outside it are no-data.
    pub mask: BinaryMask,
    pub area: AreaResult,
    pub polygons: Vec<PolygonFeature>,
    /// Diagnostic stage durations; not part of the detection outcome.
    pub timings: StageTimings,
}

impl PartialEq for SpillDetection {
    fn eq(&self, other: &Self) -> bool {
        self.mask == other.mask && self.area == other.area && self.polygons == other.polygons
    }
}

impl SpillDetection {
    /// True when nothing was flagged. This is a valid outcome, not a failure.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn report(&self) -> SpillReport {
        SpillReport {
            area_m2: self.area.square_metres(),
            area_km2: self.area.square_kilometres(),
            polygon_count: self.polygons.len(),
            flagged_cells: self.mask.flagged_count(),
            timings: self.timings.entries().to_vec(),
        }
    }
}

/// Validated, reusable stage chain. Holds no per-run state, so one pipeline
/// can serve independent regions concurrently.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    smoother: Smoother,
    thresholder: Thresholder,
    area: AreaEstimator,
    vectorizer: Vectorizer,
    logger: LogManager,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> StageResult<Self> {
        let smoother = Smoother::new(config.smooth_radius_m, config.window)?;
        let thresholder = Thresholder::new(config.cutoff, config.comparator)?;
        let vectorizer = Vectorizer::new(config.adjacency);
        Ok(Self {
            config,
            smoother,
            thresholder,
            area: AreaEstimator::new(),
            vectorizer,
            logger: LogManager::new("pipeline"),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, source: &RasterGrid, roi: &RegionOfInterest) -> StageResult<SpillDetection> {
        self.run_observed(source, roi, &mut NoopObserver)
    }

    /// Runs every stage, handing intermediates to `observer` as they appear.
    pub fn run_observed(
        &self,
        source: &RasterGrid,
        roi: &RegionOfInterest,
        observer: &mut dyn GridObserver,
    ) -> StageResult<SpillDetection> {
        let mut timings = StageTimings::new();

        let clipped = timings.time("clip", || roi.clip(source))?;
        observer.observe_grid(ObservedStage::Clipped, &clipped);

        let smoothed = timings.time(self.smoother.name(), || self.smoother.execute(&clipped))?;
        drop(clipped);
        observer.observe_grid(ObservedStage::Smoothed, &smoothed);

        let mask = timings.time(self.thresholder.name(), || {
            let raw = self.thresholder.execute(&smoothed)?;
            roi.restrict(&raw)
        })?;
        drop(smoothed);
        observer.observe_mask(ObservedStage::Mask, &mask);

        let area = timings.time(self.area.name(), || self.area.estimate(&mask, roi))?;
        let polygons = timings.time(self.vectorizer.name(), || self.vectorizer.execute(&mask))?;

        self.logger.record(&format!(
            "{} cells flagged, {} polygons, {:.2} km2",
            mask.flagged_count(),
            polygons.len(),
            area.square_kilometres()
        ));

        Ok(SpillDetection {
            mask,
            area,
            polygons,
            timings,
        })
    }
}

/// One-shot run with a square smoothing window.
pub fn run(
    source: &RasterGrid,
    roi: &RegionOfInterest,
    smooth_radius_m: f64,
    cutoff: f32,
    comparator: Comparator,
    adjacency: Adjacency,
) -> StageResult<SpillDetection> {
    Pipeline::new(PipelineConfig {
        smooth_radius_m,
        window: WindowShape::Square,
        cutoff,
        comparator,
        adjacency,
    })?
    .run(source, roi)
}
