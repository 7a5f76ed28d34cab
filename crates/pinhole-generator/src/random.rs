use crate::{Alphabet, Generator, GeneratorError, GeneratorSettings};
use parking_lot::Mutex;
use pinhole_core::ShortCode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

enum Source {
    /// The thread-local, OS-seeded generator.
    Thread,
    /// A reproducible stream. Never used on production paths.
    Seeded(Mutex<StdRng>),
}

/// Draws every symbol independently and uniformly from the alphabet.
pub struct RandomGenerator {
    alphabet: Alphabet,
    length: usize,
    source: Source,
}

impl RandomGenerator {
    /// Creates a generator backed by the thread-local RNG.
    pub fn new(settings: GeneratorSettings) -> Result<Self, GeneratorError> {
        Self::with_source(settings, Source::Thread)
    }

    /// Creates a generator whose output is fully determined by `seed`.
    pub fn seeded(settings: GeneratorSettings, seed: u64) -> Result<Self, GeneratorError> {
        Self::with_source(
            settings,
            Source::Seeded(Mutex::new(StdRng::seed_from_u64(seed))),
        )
    }

    fn with_source(settings: GeneratorSettings, source: Source) -> Result<Self, GeneratorError> {
        settings.validate()?;
        Ok(Self {
            alphabet: settings.alphabet,
            length: settings.length,
            source,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }
}

fn draw<R: Rng + ?Sized>(rng: &mut R, symbols: &[u8], length: usize) -> String {
    (0..length)
        .map(|_| symbols[rng.random_range(0..symbols.len())] as char)
        .collect()
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let symbols = self.alphabet.as_bytes();
        let code = match &self.source {
            Source::Thread => draw(&mut rand::rng(), symbols, self.length),
            Source::Seeded(rng) => draw(&mut *rng.lock(), symbols, self.length),
        };
        ShortCode::new_unchecked(code)
    }
}

impl std::fmt::Debug for RandomGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomGenerator")
            .field("alphabet", &self.alphabet)
            .field("length", &self.length)
            .field("seeded", &matches!(self.source, Source::Seeded(_)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_have_configured_length_and_alphabet() {
        let generator = RandomGenerator::new(GeneratorSettings::default()).unwrap();

        for _ in 0..1_000 {
            let code = generator.generate();
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(ShortCode::new(code.as_str()).is_ok());
        }
    }

    #[test]
    fn custom_length() {
        let settings = GeneratorSettings::builder().length(12).build();
        let generator = RandomGenerator::new(settings).unwrap();
        assert_eq!(generator.generate().as_str().len(), 12);
    }

    #[test]
    fn rejects_invalid_settings() {
        let settings = GeneratorSettings::builder().length(0).build();
        assert!(RandomGenerator::new(settings).is_err());
    }

    #[test]
    fn single_symbol_alphabet_has_one_code() {
        let settings = GeneratorSettings::builder()
            .length(1)
            .alphabet(Alphabet::new("a").unwrap())
            .build();
        let generator = RandomGenerator::new(settings).unwrap();

        for _ in 0..10 {
            assert_eq!(generator.generate().as_str(), "a");
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let first = RandomGenerator::seeded(GeneratorSettings::default(), 7).unwrap();
        let second = RandomGenerator::seeded(GeneratorSettings::default(), 7).unwrap();

        let a: Vec<_> = (0..16).map(|_| first.generate()).collect();
        let b: Vec<_> = (0..16).map(|_| second.generate()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn thread_source_is_not_fixed() {
        let generator = RandomGenerator::new(GeneratorSettings::default()).unwrap();
        let codes: HashSet<_> = (0..100).map(|_| generator.generate()).collect();
        // 62^6 possible codes; 100 draws colliding down to a handful means a broken source.
        assert!(codes.len() > 90);
    }

    #[test]
    fn every_symbol_is_reachable() {
        let settings = GeneratorSettings::builder().length(32).build();
        let generator = RandomGenerator::seeded(settings, 42).unwrap();

        let seen: HashSet<char> = (0..200)
            .flat_map(|_| generator.generate().into_string().into_bytes())
            .map(char::from)
            .collect();
        assert_eq!(seen.len(), 62);
    }

    #[test]
    fn generator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RandomGenerator>();
    }
}
