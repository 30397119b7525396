use log::warn;
use spillcore::interface::{GridObserver, ObservedStage};
use spillcore::math::Histogram;
use spillcore::RasterGrid;

use crate::gui_bridge::model::HistogramSeries;

/// Observer that histograms every scalar grid the pipeline hands it.
pub struct HistogramCollector {
    buckets: usize,
    series: Vec<HistogramSeries>,
}

impl HistogramCollector {
    pub fn new(buckets: usize) -> Self {
        Self {
            buckets,
            series: Vec::new(),
        }
    }

    pub fn into_series(self) -> Vec<HistogramSeries> {
        self.series
    }
}

impl GridObserver for HistogramCollector {
    fn observe_grid(&mut self, stage: ObservedStage, grid: &RasterGrid) {
        match Histogram::from_grid(grid, self.buckets) {
            Ok(histogram) => self.series.push(HistogramSeries {
                stage: stage.label().to_string(),
                histogram,
            }),
            Err(err) => warn!("skipping {} histogram: {}", stage.label(), err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spillcore::{Crs, GeoTransform, GridGeometry};

    #[test]
    fn collects_one_series_per_grid() {
        let geometry =
            GridGeometry::new(4, 4, GeoTransform::north_up(0.0, 0.0, 10.0), Crs::EqualArea { epsg: 6933 })
                .unwrap();
        let grid = RasterGrid::from_fn(geometry, |row, col| -(row as f32) - col as f32);
        let mut collector = HistogramCollector::new(10);
        collector.observe_grid(ObservedStage::Clipped, &grid);
        collector.observe_grid(ObservedStage::Smoothed, &grid);
        let series = collector.into_series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].stage, "smoothed");
        assert_eq!(series[0].histogram.total(), 16);
    }

    #[test]
    fn zero_buckets_are_skipped() {
        let geometry =
            GridGeometry::new(1, 1, GeoTransform::north_up(0.0, 0.0, 10.0), Crs::EqualArea { epsg: 6933 })
                .unwrap();
        let mut collector = HistogramCollector::new(0);
        collector.observe_grid(ObservedStage::Clipped, &RasterGrid::filled(geometry, 1.0));
        assert!(collector.into_series().is_empty());
    }
}
