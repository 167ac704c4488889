use crate::error::AppError;
use crate::infrastructure::engines::ModelError;
use crate::infrastructure::storage::StorageError;
use serde::Serialize;

/// Category of a job failure, surfaced to users alongside the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    StorageError,
    ModelError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::StorageError => "storage_error",
            ErrorKind::ModelError => "model_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("synthesis failed: {0}")]
    Model(#[from] ModelError),
}

impl JobError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::Validation(_) => ErrorKind::ValidationError,
            JobError::Storage(_) => ErrorKind::StorageError,
            JobError::Model(_) => ErrorKind::ModelError,
        }
    }
}

/// Failure recorded on a finished job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&JobError> for JobFailure {
    fn from(err: &JobError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<JobError> for AppError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Validation(msg) => AppError::BadRequest(msg),
            JobError::Storage(e) => AppError::Storage(e.to_string()),
            JobError::Model(e) => AppError::Model(e.reason),
        }
    }
}
