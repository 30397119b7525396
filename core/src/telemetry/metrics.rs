use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Wall-clock duration of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: String,
    pub millis: f64,
}

/// Per-run stage durations, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    entries: Vec<StageTiming>,
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f`, recording its duration under `stage`.
    pub fn time<T, F>(&mut self, stage: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let started = Instant::now();
        let output = f();
        self.entries.push(StageTiming {
            stage: stage.to_string(),
            millis: started.elapsed().as_secs_f64() * 1_000.0,
        });
        output
    }

    pub fn entries(&self) -> &[StageTiming] {
        &self.entries
    }

    pub fn total_millis(&self) -> f64 {
        self.entries.iter().map(|e| e.millis).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_keep_execution_order() {
        let mut timings = StageTimings::new();
        let value = timings.time("first", || 2);
        timings.time("second", || ());
        assert_eq!(value, 2);
        let names: Vec<_> = timings.entries().iter().map(|e| e.stage.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(timings.total_millis() >= 0.0);
    }
}
