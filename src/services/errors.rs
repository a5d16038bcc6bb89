use thiserror::Error;

/// Failure taxonomy shared by every course, review, enrollment and rating operation.
#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    InvalidOrder(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    AlreadyDeleted(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("draft limit of {limit} courses reached")]
    DraftLimitExceeded { limit: i64 },
    #[error("invalid asset reference: {0}")]
    InvalidAssetReference(String),
    #[error("already enrolled in this course")]
    AlreadyEnrolled,
    #[error("{0}")]
    UpstreamUnavailable(String),
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

pub(crate) type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub(crate) fn course_not_found() -> Self {
        Self::NotFound("Course not found".to_string())
    }

    pub(crate) fn concurrent_update() -> Self {
        Self::Conflict("Course was modified concurrently; reload and retry".to_string())
    }
}
