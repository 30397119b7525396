use crate::raster::{BinaryMask, RasterGrid};

/// Pipeline checkpoints handed to a [`GridObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedStage {
    Clipped,
    Smoothed,
    Mask,
}

impl ObservedStage {
    pub fn label(self) -> &'static str {
        match self {
            ObservedStage::Clipped => "clipped",
            ObservedStage::Smoothed => "smoothed",
            ObservedStage::Mask => "mask",
        }
    }
}

/// Read-only consumer of intermediate grids (histograms, previews).
pub trait GridObserver {
    fn observe_grid(&mut self, _stage: ObservedStage, _grid: &RasterGrid) {}

    fn observe_mask(&mut self, _stage: ObservedStage, _mask: &BinaryMask) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GridObserver for NoopObserver {}
