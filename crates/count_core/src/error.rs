use thiserror::Error;

use crate::contract::ValidationError;

/// Fatal errors that stop a count before or instead of producing a report.
/// Failed pages are not errors; they end up in the segment outcomes.
#[derive(Debug, Error)]
pub enum CountError {
    #[error("invalid scan configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("table '{table}' is not ready: {diagnostic}")]
    TableNotReady { table: String, diagnostic: String },

    #[error("scan coordinator has already run")]
    AlreadyRun,

    #[error("failed to start segment workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
