use jiff::Timestamp;
use pinhole_core::error::Result;
use pinhole_core::{Mapping, Repository, ShortCode, ShortenerError};
use pinhole_generator::Generator;
use std::sync::Arc;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

/// Default number of candidates tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Hard ceiling on `max_attempts`, whatever the configuration says.
pub const MAX_ATTEMPTS_CAP: usize = 1000;

/// Tunables for the allocation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct ShortenerSettings {
    /// Candidates to try per allocation, clamped to `1..=1000`.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,
}

impl ShortenerSettings {
    /// The attempt bound actually enforced.
    pub fn effective_max_attempts(&self) -> usize {
        self.max_attempts.clamp(1, MAX_ATTEMPTS_CAP)
    }
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Allocates globally unique short codes.
///
/// Uniqueness is delegated to the store's atomic insert-if-absent: a
/// candidate that collides with a live mapping is discarded and a new one is
/// drawn, up to the configured number of attempts.
///
/// Dropping the future returned by [`allocate`](Self::allocate) stops further
/// attempts. A mapping that was already inserted stays in the store.
#[derive(Debug)]
pub struct Allocator<R, G> {
    repository: Arc<R>,
    generator: G,
    max_attempts: usize,
}

impl<R: Repository, G: Generator> Allocator<R, G> {
    pub fn new(repository: Arc<R>, generator: G, settings: ShortenerSettings) -> Self {
        Self {
            repository,
            generator,
            max_attempts: settings.effective_max_attempts(),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Creates a mapping for `target_url` under a freshly generated code.
    pub async fn allocate(&self, target_url: &str) -> Result<Mapping> {
        validate_url(target_url)?;

        for attempt in 1..=self.max_attempts {
            let code: ShortCode = self.generator.generate().into();
            let mapping = Mapping::new(code, target_url, Timestamp::now());

            if self.repository.insert_if_absent(&mapping).await? {
                debug!(code = %mapping.code, attempt, "allocated short code");
                return Ok(mapping);
            }

            trace!(code = %mapping.code, attempt, "short code collision");
        }

        debug!(attempts = self.max_attempts, "short code allocation exhausted");
        Err(ShortenerError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Target URLs only need to be non-blank.
pub(crate) fn validate_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(ShortenerError::InvalidUrl(
            "URL cannot be empty".to_string(),
        ));
    }
    Ok(())
}
