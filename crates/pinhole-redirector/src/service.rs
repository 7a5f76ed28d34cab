use std::sync::Arc;

use async_trait::async_trait;
use pinhole_core::error::Result;
use pinhole_core::{Mapping, Redirector, Repository, ShortCode, ShortenerError};
use tracing::{debug, trace};

/// Service for handling URL redirects.
///
/// A resolution is one atomic store call that counts the access and returns
/// the record it counted, so the served target and the counted record are
/// always the same row. No lock is held in-process, so resolves of the same
/// code proceed in parallel.
#[derive(Debug)]
pub struct RedirectorService<R> {
    repository: Arc<R>,
}

impl<R> Clone for RedirectorService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: Repository> RedirectorService<R> {
    /// Creates a new RedirectorService with the given repository.
    pub fn new(repository: impl Into<Arc<R>>) -> Self {
        Self {
            repository: repository.into(),
        }
    }

    /// Resolves a short code to its target URL, counting the access.
    ///
    /// The count is visible to `stats` once this returns.
    pub async fn resolve(&self, code: &ShortCode) -> Result<String> {
        trace!(code = %code, "resolving short code");

        match self.repository.atomic_increment(code).await? {
            Some(mapping) => {
                debug!(code = %code, url = %mapping.target_url, "resolved short code");
                Ok(mapping.target_url)
            }
            None => {
                trace!(code = %code, "short code not found");
                Err(ShortenerError::NotFound(code.to_string()))
            }
        }
    }

    /// Returns the full mapping without counting an access.
    pub async fn stats(&self, code: &ShortCode) -> Result<Mapping> {
        self.repository
            .get(code)
            .await?
            .ok_or_else(|| ShortenerError::NotFound(code.to_string()))
    }
}

#[async_trait]
impl<R: Repository> Redirector for RedirectorService<R> {
    async fn resolve(&self, code: &ShortCode) -> Result<String> {
        RedirectorService::resolve(self, code).await
    }

    async fn stats(&self, code: &ShortCode) -> Result<Mapping> {
        RedirectorService::stats(self, code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use pinhole_storage::InMemoryRepository;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    async fn setup_with(codes: &[(&str, &str)]) -> RedirectorService<InMemoryRepository> {
        let repo = InMemoryRepository::new();
        for (c, url) in codes {
            repo.insert_if_absent(&Mapping::new(code(c), *url, Timestamp::now()))
                .await
                .unwrap();
        }
        RedirectorService::new(repo)
    }

    #[tokio::test]
    async fn resolve_existing_code() {
        let service = setup_with(&[("abc123", "https://example.com")]).await;

        let url = service.resolve(&code("abc123")).await.unwrap();
        assert_eq!(url, "https://example.com");
    }

    #[tokio::test]
    async fn resolve_nonexistent_code() {
        let service = setup_with(&[]).await;

        let err = service.resolve(&code("nope")).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(ref c) if c == "nope"));
    }

    #[tokio::test]
    async fn resolve_counts_each_access() {
        let service = setup_with(&[("abc", "https://example.com")]).await;

        assert_eq!(service.stats(&code("abc")).await.unwrap().access_count, 0);
        for _ in 0..3 {
            service.resolve(&code("abc")).await.unwrap();
        }
        assert_eq!(service.stats(&code("abc")).await.unwrap().access_count, 3);
    }

    #[tokio::test]
    async fn stats_has_no_side_effect() {
        let service = setup_with(&[("abc", "https://example.com")]).await;

        for _ in 0..5 {
            service.stats(&code("abc")).await.unwrap();
        }
        let mapping = service.stats(&code("abc")).await.unwrap();
        assert_eq!(mapping.access_count, 0);
        assert_eq!(mapping.target_url, "https://example.com");
    }

    #[tokio::test]
    async fn stats_for_missing_code() {
        let service = setup_with(&[]).await;

        let err = service.stats(&code("nope")).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_resolves_lose_no_counts() {
        let service = setup_with(&[("hot", "https://example.com")]).await;

        let handles: Vec<_> = (0..1000)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.resolve(&code("hot")).await.unwrap() })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), "https://example.com");
        }

        assert_eq!(service.stats(&code("hot")).await.unwrap().access_count, 1000);
    }

    /// Swaps the record under a code for a new one right before every
    /// increment, as a concurrent delete and re-allocation would.
    struct ReplacedBeforeIncrement {
        inner: InMemoryRepository,
        replacement_url: &'static str,
    }

    #[async_trait]
    impl pinhole_core::ReadRepository for ReplacedBeforeIncrement {
        async fn get(&self, code: &ShortCode) -> pinhole_core::repository::Result<Option<Mapping>> {
            self.inner.get(code).await
        }

        async fn list_all(&self) -> pinhole_core::repository::Result<Vec<Mapping>> {
            self.inner.list_all().await
        }
    }

    #[async_trait]
    impl Repository for ReplacedBeforeIncrement {
        async fn insert_if_absent(&self, mapping: &Mapping) -> pinhole_core::repository::Result<bool> {
            self.inner.insert_if_absent(mapping).await
        }

        async fn atomic_increment(
            &self,
            code: &ShortCode,
        ) -> pinhole_core::repository::Result<Option<Mapping>> {
            if self.inner.delete(code).await? {
                let replacement = Mapping::new(code.clone(), self.replacement_url, Timestamp::now());
                self.inner.insert_if_absent(&replacement).await?;
            }
            self.inner.atomic_increment(code).await
        }

        async fn update(
            &self,
            code: &ShortCode,
            patch: pinhole_core::MappingPatch,
        ) -> pinhole_core::repository::Result<Option<Mapping>> {
            self.inner.update(code, patch).await
        }

        async fn rename_if_absent(
            &self,
            from: &ShortCode,
            to: &ShortCode,
            now: Timestamp,
        ) -> pinhole_core::repository::Result<pinhole_core::RenameOutcome> {
            self.inner.rename_if_absent(from, to, now).await
        }

        async fn delete(&self, code: &ShortCode) -> pinhole_core::repository::Result<bool> {
            self.inner.delete(code).await
        }
    }

    #[tokio::test]
    async fn served_target_belongs_to_the_counted_record() {
        let inner = InMemoryRepository::new();
        inner
            .insert_if_absent(&Mapping::new(code("abc"), "https://a.example", Timestamp::now()))
            .await
            .unwrap();
        let service = RedirectorService::new(ReplacedBeforeIncrement {
            inner,
            replacement_url: "https://b.example",
        });

        let served = service.resolve(&code("abc")).await.unwrap();
        let record = service.stats(&code("abc")).await.unwrap();

        assert_eq!(served, record.target_url);
        assert_eq!(record.target_url, "https://b.example");
        assert_eq!(record.access_count, 1);
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let service: Arc<dyn Redirector> =
            Arc::new(setup_with(&[("abc", "https://example.com")]).await);

        assert_eq!(service.resolve(&code("abc")).await.unwrap(), "https://example.com");
        assert_eq!(service.stats(&code("abc")).await.unwrap().access_count, 1);
    }
}
