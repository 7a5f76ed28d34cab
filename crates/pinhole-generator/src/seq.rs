use crate::{Alphabet, Generator, GeneratorError, GeneratorSettings};
use pinhole_core::ShortCode;
use std::sync::atomic::{AtomicU64, Ordering};

/// A short code generator using a sequential counter.
///
/// The counter is written in the alphabet's positional notation and padded
/// to the configured length, so with base62 and length 6 the codes run
/// "AAAAAA", "AAAAAB", ... Once the code space is used up the counter wraps
/// and the allocator starts seeing collisions.
///
/// For distributed deployments, give each node a disjoint offset range
/// (e.g., node 1 starts at 0, node 2 at 1_000_000).
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    alphabet: Alphabet,
    length: usize,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            alphabet: self.alphabet.clone(),
            length: self.length,
        }
    }
}

impl SeqGenerator {
    /// Creates a sequential generator starting at zero.
    pub fn new(settings: GeneratorSettings) -> Result<Self, GeneratorError> {
        Self::with_offset(settings, 0)
    }

    /// Creates a sequential generator starting from a specific counter value.
    ///
    /// Useful for resuming from a known state.
    pub fn with_offset(settings: GeneratorSettings, offset: u64) -> Result<Self, GeneratorError> {
        settings.validate()?;
        Ok(Self {
            counter: AtomicU64::new(offset),
            alphabet: settings.alphabet,
            length: settings.length,
        })
    }

    fn encode(&self, mut value: u64) -> String {
        let symbols = self.alphabet.as_bytes();
        let base = symbols.len() as u64;
        let mut out = vec![symbols[0]; self.length];

        for slot in out.iter_mut().rev() {
            *slot = symbols[(value % base) as usize];
            value /= base;
        }

        // alphabet symbols are ASCII
        out.into_iter().map(char::from).collect()
    }
}

impl Generator for SeqGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        ShortCode::new_unchecked(self.encode(count))
    }
}
