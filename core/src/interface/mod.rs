//! Contracts for the collaborators around the core: raster sources,
//! visualisation observers, and feature exporters.

pub mod export;
pub mod observer;
pub mod report;
pub mod source;

pub use export::{ExportFormat, ExportTarget, FeatureExporter};
pub use observer::{GridObserver, NoopObserver, ObservedStage};
pub use report::SpillReport;
pub use source::{RasterSource, SourceRequest, TimeRange};
