use serde::{Deserialize, Serialize};

use crate::prelude::{SpillError, StageResult};
use crate::telemetry::metrics::StageTiming;

/// Serialisable summary of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpillReport {
    pub area_m2: f64,
    pub area_km2: f64,
    pub polygon_count: usize,
    pub flagged_cells: usize,
    pub timings: Vec<StageTiming>,
}

impl SpillReport {
    pub fn to_json(&self) -> StageResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| SpillError::Internal(format!("serialising report: {}", err)))
    }
}
