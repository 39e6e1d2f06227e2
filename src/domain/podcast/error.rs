use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum PodcastServiceError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("document too large: {size} bytes exceeds the {limit} byte limit")]
    DocumentTooLarge { size: usize, limit: usize },
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("job already finished")]
    AlreadyFinished,
    #[error("job queue is full")]
    QueueFull,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<PodcastServiceError> for AppError {
    fn from(err: PodcastServiceError) -> Self {
        match err {
            PodcastServiceError::InvalidParameters(msg) => AppError::BadRequest(msg),
            PodcastServiceError::DocumentTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            PodcastServiceError::NotFound(what) => AppError::NotFound(what),
            PodcastServiceError::AlreadyFinished => {
                AppError::Conflict("Job already finished".to_string())
            }
            PodcastServiceError::QueueFull => AppError::ServiceUnavailable(
                "Job queue full, please retry later".to_string(),
            ),
            PodcastServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
