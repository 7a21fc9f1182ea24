use thiserror::Error;

/// Error taxonomy for the profiling pipeline. Structural parse failures and
/// DataFrame construction errors all funnel through here; the binaries let
/// them propagate and exit non-zero.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("File processing error: {0}")]
    FileProcessing(String),

    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::error::PolarsError),
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}
