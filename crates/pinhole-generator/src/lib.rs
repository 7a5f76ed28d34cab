//! Short code generators.
//!
//! Generators are pure: they never look at storage, so a generated code may
//! already be taken. The allocation engine resolves collisions by retrying
//! against the store's atomic insert.

pub mod random;
pub mod seq;

use pinhole_core::shortcode::{MAX_LENGTH, MIN_LENGTH};
use pinhole_core::ShortCode;
use thiserror::Error;
use typed_builder::TypedBuilder;

pub use random::RandomGenerator;
pub use seq::SeqGenerator;

/// Default number of symbols in a generated code.
pub const DEFAULT_LENGTH: usize = 6;

const BASE62: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Trait for generating short codes.
///
/// Implementations can vary from simple random generators to
/// distributed ID generators (e.g., Snowflake, UUID, etc.)
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;

    /// Generates a candidate short code.
    fn generate(&self) -> Self::Output;
}

impl<G: Generator> Generator for std::sync::Arc<G> {
    type Output = G::Output;

    fn generate(&self) -> Self::Output {
        (**self).generate()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("invalid code length {length}; expected {min}..={max}")]
    InvalidLength { length: usize, min: usize, max: usize },
    #[error("alphabet must not be empty")]
    EmptyAlphabet,
    #[error("alphabet symbol {0:?} is not an ASCII letter or digit")]
    InvalidSymbol(char),
    #[error("alphabet symbol {0:?} appears more than once")]
    DuplicateSymbol(char),
}

/// The ordered set of symbols a generator draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Box<[u8]>,
}

impl Alphabet {
    /// `A-Z`, `a-z` and `0-9`.
    pub fn base62() -> Self {
        Self {
            symbols: BASE62.as_bytes().into(),
        }
    }

    /// Builds a custom alphabet.
    ///
    /// Symbols must be distinct ASCII letters or digits so every generated
    /// code is also a valid [`ShortCode`].
    pub fn new(symbols: &str) -> Result<Self, GeneratorError> {
        if symbols.is_empty() {
            return Err(GeneratorError::EmptyAlphabet);
        }

        let mut seen = [false; 128];
        for c in symbols.chars() {
            if !c.is_ascii_alphanumeric() {
                return Err(GeneratorError::InvalidSymbol(c));
            }
            let slot = &mut seen[c as usize];
            if *slot {
                return Err(GeneratorError::DuplicateSymbol(c));
            }
            *slot = true;
        }

        Ok(Self {
            symbols: symbols.as_bytes().into(),
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.symbols
    }

    /// Number of distinct codes of `length` symbols, or `None` if it
    /// does not fit in a `u64`.
    pub fn code_space(&self, length: usize) -> Option<u64> {
        let exp = u32::try_from(length).ok()?;
        (self.symbols.len() as u64).checked_pow(exp)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::base62()
    }
}

/// Configures the shape of generated codes.
#[derive(Debug, Clone, TypedBuilder)]
pub struct GeneratorSettings {
    /// Number of symbols per code, in `1..=32`.
    #[builder(default = DEFAULT_LENGTH)]
    pub length: usize,
    #[builder(default)]
    pub alphabet: Alphabet,
}

impl GeneratorSettings {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&self.length) {
            return Err(GeneratorError::InvalidLength {
                length: self.length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }
        Ok(())
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}
