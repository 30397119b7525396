use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use spillcore::interface::{ExportFormat, ExportTarget, TimeRange};
use spillcore::math::Coord;
use spillcore::processing::{Adjacency, Comparator, WindowShape};
use spillcore::{Crs, PipelineConfig, RegionOfInterest};
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::scene::SceneConfig;

/// Analysis region as written in a workflow file: either a rectangle
/// `[min_x, min_y, max_x, max_y]` or explicit rings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiConfig {
    pub crs: Crs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rectangle: Option<[f64; 4]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rings: Vec<Vec<Coord>>,
}

impl RoiConfig {
    pub fn to_region(&self) -> anyhow::Result<RegionOfInterest> {
        let region = match (&self.rectangle, self.rings.is_empty()) {
            (Some(_), false) => bail!("roi takes either a rectangle or rings, not both"),
            (Some([min_x, min_y, max_x, max_y]), true) => {
                RegionOfInterest::rectangle(*min_x, *min_y, *max_x, *max_y, self.crs)?
            }
            (None, false) => RegionOfInterest::new(self.rings.clone(), self.crs)?,
            (None, true) => bail!("roi needs a rectangle or at least one ring"),
        };
        Ok(region)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Synthetic(SceneConfig),
    AsciiGrid { path: PathBuf, crs: Crs },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Synthetic(SceneConfig::default())
    }
}

fn default_layer() -> String {
    "VV".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub roi: RoiConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default)]
    pub time_range: Option<TimeRange>,
    #[serde(default)]
    pub export: Option<ExportTarget>,
}

impl Default for WorkflowConfig {
    /// Synthetic Corantijn scene with the reference detection parameters.
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            roi: RoiConfig {
                crs: Crs::Geographic,
                rectangle: Some([-57.2, 5.8, -56.9, 6.0]),
                rings: Vec::new(),
            },
            source: SourceConfig::default(),
            layer: default_layer(),
            time_range: Some(TimeRange {
                start: "2021-10-04".into(),
                end: "2021-10-04".into(),
            }),
            export: None,
        }
    }
}

/// Command-line values that take precedence over the workflow file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub radius: Option<f64>,
    pub window: Option<WindowShape>,
    pub cutoff: Option<f32>,
    pub comparator: Option<Comparator>,
    pub adjacency: Option<Adjacency>,
    pub export: Option<PathBuf>,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(overrides: &Overrides) -> Self {
        let mut config = Self::default();
        config.apply(overrides);
        config
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        let pipeline = &mut self.pipeline;
        if let Some(radius) = overrides.radius {
            pipeline.smooth_radius_m = radius;
        }
        if let Some(window) = overrides.window {
            pipeline.window = window;
        }
        if let Some(cutoff) = overrides.cutoff {
            pipeline.cutoff = cutoff;
        }
        if let Some(comparator) = overrides.comparator {
            pipeline.comparator = comparator;
        }
        if let Some(adjacency) = overrides.adjacency {
            pipeline.adjacency = adjacency;
        }
        if let Some(path) = overrides.export.as_ref() {
            let format = match path.extension().and_then(|ext| ext.to_str()) {
                Some("wkt") | Some("txt") => ExportFormat::Wkt,
                _ => ExportFormat::GeoJson,
            };
            self.export = Some(ExportTarget {
                format,
                path: path.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_overrides_pipeline() {
        let cfg = WorkflowConfig::from_args(&Overrides {
            cutoff: Some(-18.0),
            adjacency: Some(Adjacency::Eight),
            export: Some(PathBuf::from("out/spill.wkt")),
            ..Default::default()
        });
        assert_eq!(cfg.pipeline.cutoff, -18.0);
        assert_eq!(cfg.pipeline.adjacency, Adjacency::Eight);
        assert_eq!(cfg.pipeline.smooth_radius_m, 100.0);
        assert_eq!(cfg.export.unwrap().format, ExportFormat::Wkt);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"pipeline:\n  smooth_radius_m: 30\n  cutoff: -20\n  adjacency: eight\n\
roi:\n  crs: { kind: utm, zone: 21, north: true }\n  rectangle: [500000, 650000, 501000, 651000]\n\
source:\n  kind: ascii_grid\n  path: scene.asc\n  crs: { kind: utm, zone: 21, north: true }\n\
export:\n  path: out/spill.geojson\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.pipeline.smooth_radius_m, 30.0);
        assert_eq!(cfg.pipeline.comparator, Comparator::Lt);
        assert_eq!(cfg.layer, "VV");
        assert!(matches!(cfg.source, SourceConfig::AsciiGrid { .. }));
        assert_eq!(cfg.export.unwrap().format, ExportFormat::GeoJson);
        assert!(cfg.roi.to_region().is_ok());
    }

    #[test]
    fn synthetic_source_round_trips_through_yaml() {
        let cfg = WorkflowConfig::default();
        let text = serde_yaml::to_string(&cfg).unwrap();
        let parsed: WorkflowConfig = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn roi_requires_exactly_one_shape() {
        let mut roi = WorkflowConfig::default().roi;
        roi.rings = vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]];
        assert!(roi.to_region().is_err());
        roi.rectangle = None;
        assert!(roi.to_region().is_ok());
        roi.rings.clear();
        assert!(roi.to_region().is_err());
    }
}
