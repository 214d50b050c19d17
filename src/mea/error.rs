use thiserror::Error;
#[derive(Debug, Error)]
pub enum MeaError {
    #[error("{what} out of range: {value}")]
    InvalidRange { what: &'static str, value: f64 },
    #[error("unknown electrode: {0}")]
    UnknownElectrode(String),
    #[error("corrupt recording: {0}")]
    CorruptRecording(String),
    #[error("failed to read recording: {0}")]
    Csv(#[from] csv::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid viewer config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to render snapshot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for MeaError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        MeaError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for MeaError {
    fn from(value: image::ImageError) -> Self {
        MeaError::Plot(value.to_string())
    }
}
