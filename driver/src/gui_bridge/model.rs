use serde::{Deserialize, Serialize};
use spillcore::interface::SpillReport;
use spillcore::math::Histogram;

/// Histogram of one pipeline checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSeries {
    pub stage: String,
    pub histogram: Histogram,
}

/// Snapshot served to display clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationModel {
    pub report: Option<SpillReport>,
    pub histograms: Vec<HistogramSeries>,
}
