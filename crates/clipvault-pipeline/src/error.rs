use crate::repository::RepositoryError;
use crate::validation::ValidationError;
use clipvault_core::AppError;
use clipvault_processing::ProcessingError;
use clipvault_storage::{KeyError, ReferenceError, StorageError};
use thiserror::Error;
use uuid::Uuid;

/// Failure of an upload or resolve, tagged with the stage that failed
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Video {0} not found")]
    NotFound(Uuid),

    #[error("User {user_id} does not own video {video_id}")]
    Unauthorized { video_id: Uuid, user_id: Uuid },

    #[error("Failed to buffer upload: {0}")]
    Buffer(#[source] std::io::Error),

    #[error("Couldn't get video aspect ratio: {0}")]
    Probe(#[source] ProcessingError),

    #[error("Couldn't process video for fast start: {0}")]
    Remux(#[source] ProcessingError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(ValidationError::UnsupportedMediaType { .. }) => {
                AppError::UnsupportedMediaType(err.to_string())
            }
            PipelineError::Validation(ValidationError::PayloadTooLarge { .. }) => {
                AppError::PayloadTooLarge(err.to_string())
            }
            PipelineError::Validation(ValidationError::EmptyBody) => {
                AppError::InvalidInput(err.to_string())
            }
            PipelineError::NotFound(_) => AppError::NotFound(err.to_string()),
            PipelineError::Unauthorized { .. } => {
                AppError::Unauthorized("Couldn't validate user".to_string())
            }
            PipelineError::Buffer(e) => AppError::Internal(format!("Failed to buffer upload: {}", e)),
            PipelineError::Probe(e) => AppError::Probe(e.to_string()),
            PipelineError::Remux(e) => AppError::Processing(e.to_string()),
            PipelineError::Key(e) => e.into(),
            PipelineError::Storage(e) => e.into(),
            PipelineError::Reference(e) => e.into(),
            PipelineError::Repository(e) => e.into(),
        }
    }
}
