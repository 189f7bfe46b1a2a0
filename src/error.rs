use std::process::ExitCode;

use crate::dataflow::DataflowError;

pub type Result<T> = std::result::Result<T, WorkerCountError>;

/// Every way an invocation can end without a worker count.
#[derive(Debug, thiserror::Error)]
pub enum WorkerCountError {
    #[error("Invalid arguments: {0}")]
    Validation(String),
    #[error("Authentication error: {0}")]
    Authentication(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("API error: {0}")]
    Api(String),
    #[error(
        "Could not determine desired worker count. No autoscaling events with current or target worker counts found in the last {minutes} minute(s) ({events_seen} event(s) inspected)."
    )]
    NoData { minutes: u64, events_seen: usize },
}

impl WorkerCountError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Validation(_) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}

impl From<DataflowError> for WorkerCountError {
    fn from(err: DataflowError) -> Self {
        match err {
            DataflowError::NotFound(msg) => Self::NotFound(msg),
            DataflowError::Unauthenticated(msg) | DataflowError::PermissionDenied(msg) => {
                Self::Authentication(msg)
            }
            DataflowError::Credentials(msg) => Self::Authentication(msg),
            other => Self::Api(other.to_string()),
        }
    }
}
