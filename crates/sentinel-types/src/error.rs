use thiserror::Error;

/// Errors surfaced to HTTP callers; never raised across a check boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown check id: {0}")]
    UnknownCheck(String),
    #[error("check is not host-ingested: {0}")]
    NotHostIngested(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("a cycle is already running")]
    CycleInProgress,
    #[error("malformed request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::UnknownCheck(_) => "unknown_check",
            ApiError::NotHostIngested(_) => "not_host_ingested",
            ApiError::Unauthorized => "unauthorized",
            ApiError::CycleInProgress => "cycle_in_progress",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal",
        }
    }
}
