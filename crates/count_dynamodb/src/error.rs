use count_core::{CountError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Count(#[from] CountError),

    #[error("invalid arguments: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}
