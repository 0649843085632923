use linkhop_core::StorageError;
use linkhop_generator::GeneratorError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LinkError {
    /// The submitted URL was rejected. The message is safe to show to clients.
    #[error("{0}")]
    Validation(String),
    #[error("no free id found after {attempts} attempts")]
    CollisionExhausted { attempts: u32 },
    #[error("link not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("id generation failed: {0}")]
    Generator(#[from] GeneratorError),
}

impl LinkError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
