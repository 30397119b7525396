/// Common error type for stage execution.
///
/// An empty mask or an empty polygon set is a valid outcome and is never
/// reported through this type.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SpillError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, SpillError>;

/// A configured pipeline stage.
///
/// Stages validate their parameters when constructed and never mutate their
/// input; `execute` always produces a fresh value.
pub trait ProcessingStage<I: ?Sized> {
    type Output;

    fn name(&self) -> &'static str;
    fn execute(&self, input: &I) -> StageResult<Self::Output>;
}
