use crate::{Generator, GeneratorError};
use linkhop_core::ShortCode;
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::TryRngCore;

/// The 62 characters identifiers are drawn from.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_ID_LENGTH: usize = 8;

// Largest multiple of 62 that fits in a byte; bytes at or above it are
// rejected so every character stays equally likely.
const REJECTION_BOUND: u8 = (u8::MAX as usize / ALPHABET.len() * ALPHABET.len()) as u8;

/// Where a [`RandomGenerator`] gets its bytes from.
pub trait EntropySource: Send + Sync + 'static {
    fn fill(&self, buf: &mut [u8]) -> Result<(), GeneratorError>;
}

/// The operating system's CSPRNG. Stateless, so callers never contend.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEntropy;

impl EntropySource for SystemEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), GeneratorError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| GeneratorError::Entropy(e.to_string()))
    }
}

/// A stateful generator, such as a seeded one, shared behind a lock.
#[derive(Debug)]
pub struct SharedRng<R>(Mutex<R>);

impl<R> EntropySource for SharedRng<R>
where
    R: TryRngCore + Send + 'static,
{
    fn fill(&self, buf: &mut [u8]) -> Result<(), GeneratorError> {
        self.0
            .lock()
            .try_fill_bytes(buf)
            .map_err(|e| GeneratorError::Entropy(e.to_string()))
    }
}

/// Draws fixed-length identifiers uniformly from [`ALPHABET`].
///
/// Backed by the operating system's CSPRNG unless another generator is
/// supplied through [`RandomGenerator::with_rng`].
#[derive(Debug)]
pub struct RandomGenerator<E = SystemEntropy> {
    length: usize,
    source: E,
}

impl RandomGenerator<SystemEntropy> {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            source: SystemEntropy,
        }
    }
}

impl Default for RandomGenerator<SystemEntropy> {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LENGTH)
    }
}

impl<R> RandomGenerator<SharedRng<R>>
where
    R: TryRngCore + Send + 'static,
{
    pub fn with_rng(length: usize, rng: R) -> Self {
        Self {
            length,
            source: SharedRng(Mutex::new(rng)),
        }
    }
}

impl<E: EntropySource> Generator for RandomGenerator<E> {
    fn generate(&self) -> Result<ShortCode, GeneratorError> {
        let mut code = String::with_capacity(self.length);
        let mut buf = vec![0_u8; self.length.max(1) * 2];

        while code.len() < self.length {
            self.source.fill(&mut buf)?;

            for &byte in buf.iter().filter(|&&b| b < REJECTION_BOUND) {
                if code.len() == self.length {
                    break;
                }
                code.push(ALPHABET[usize::from(byte) % ALPHABET.len()] as char);
            }
        }

        Ok(ShortCode::new_unchecked(code))
    }
}
