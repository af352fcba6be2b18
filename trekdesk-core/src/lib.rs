pub mod notifier;
pub mod repository;
pub mod validation;

pub use notifier::{Notifier, RecordingNotifier, TracingNotifier};
pub use repository::{BatchRepository, BookingRepository, RepoResult, UserRepository};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
