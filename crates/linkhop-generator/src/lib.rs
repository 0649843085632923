//! Short identifier generation.

pub mod random;

pub use random::{
    EntropySource, RandomGenerator, SharedRng, SystemEntropy, ALPHABET, DEFAULT_ID_LENGTH,
};

use linkhop_core::ShortCode;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    /// The secure random source failed. Generators never fall back to a
    /// predictable source; the caller decides whether to retry or abort.
    #[error("secure random source failed: {0}")]
    Entropy(String),
}

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage:
/// uniqueness is enforced by the store's conditional create, so a generator
/// only has to make collisions unlikely.
pub trait Generator: Send + Sync + 'static {
    /// Generates a fresh candidate short code.
    fn generate(&self) -> Result<ShortCode, GeneratorError>;
}
