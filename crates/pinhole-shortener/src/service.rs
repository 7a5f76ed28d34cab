use crate::allocator::{Allocator, ShortenerSettings};
use crate::mutation::Mutator;
use async_trait::async_trait;
use pinhole_core::error::Result;
use pinhole_core::{Mapping, Repository, ShortCode, Shortener};
use pinhole_generator::Generator;
use std::sync::Arc;

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository` and a `Generator` to handle:
/// - Short code allocation with collision retry
/// - Target updates, renames and deletes
/// - Listing
///
/// The repository handle is shared, so the same store can also back a
/// redirector or another service instance.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    allocator: Allocator<R, G>,
    mutator: Mutator<R>,
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    /// Creates a new `ShortenerService` with default settings.
    pub fn new(repository: impl Into<Arc<R>>, generator: G) -> Self {
        Self::with_settings(repository, generator, ShortenerSettings::default())
    }

    pub fn with_settings(
        repository: impl Into<Arc<R>>,
        generator: G,
        settings: ShortenerSettings,
    ) -> Self {
        let repository = repository.into();
        Self {
            allocator: Allocator::new(Arc::clone(&repository), generator, settings),
            mutator: Mutator::new(repository),
        }
    }

    pub fn allocator(&self) -> &Allocator<R, G> {
        &self.allocator
    }

    pub fn mutator(&self) -> &Mutator<R> {
        &self.mutator
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn allocate(&self, target_url: &str) -> Result<Mapping> {
        self.allocator.allocate(target_url).await
    }

    async fn update_target(&self, code: &ShortCode, new_url: &str) -> Result<Mapping> {
        self.mutator.update_target(code, new_url).await
    }

    async fn rename(&self, old_code: &ShortCode, new_code: &str) -> Result<Mapping> {
        self.mutator.rename(old_code, new_code).await
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        self.mutator.delete(code).await
    }

    async fn list_all(&self) -> Result<Vec<Mapping>> {
        self.mutator.list_all().await
    }
}
