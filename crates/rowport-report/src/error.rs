use thiserror::Error;

use crate::JobId;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("internal error: {0}")]
    InternalError(String),
    #[error("report job {job_id} is already locked for connection {connection}")]
    AlreadyLocked { connection: String, job_id: JobId },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ReportError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ReportError::InvalidArgument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        ReportError::NotSupported(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ReportError::InternalError(message.into())
    }
}
