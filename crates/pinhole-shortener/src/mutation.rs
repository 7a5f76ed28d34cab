use crate::allocator::validate_url;
use jiff::Timestamp;
use pinhole_core::error::Result;
use pinhole_core::{Mapping, MappingPatch, RenameOutcome, Repository, ShortCode, ShortenerError};
use std::sync::Arc;
use tracing::debug;

/// Changes and removes existing mappings.
///
/// Each operation is a single atomic store call, so two mutations racing on
/// the same code resolve to whichever the store commits first and the loser
/// fails cleanly.
#[derive(Debug)]
pub struct Mutator<R> {
    repository: Arc<R>,
}

impl<R> Clone for Mutator<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: Repository> Mutator<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Points an existing code at a new URL.
    pub async fn update_target(&self, code: &ShortCode, new_url: &str) -> Result<Mapping> {
        validate_url(new_url)?;

        let updated = self
            .repository
            .update(code, MappingPatch::target(new_url, Timestamp::now()))
            .await?
            .ok_or_else(|| ShortenerError::NotFound(code.to_string()))?;

        debug!(code = %code, "updated target url");
        Ok(updated)
    }

    /// Moves a mapping to `new_code`, keeping its counter and creation time.
    pub async fn rename(&self, old_code: &ShortCode, new_code: &str) -> Result<Mapping> {
        let new_code = ShortCode::new(new_code)?;

        match self
            .repository
            .rename_if_absent(old_code, &new_code, Timestamp::now())
            .await?
        {
            RenameOutcome::Renamed(mapping) => {
                debug!(from = %old_code, to = %new_code, "renamed short code");
                Ok(mapping)
            }
            RenameOutcome::SourceMissing => Err(ShortenerError::NotFound(old_code.to_string())),
            RenameOutcome::TargetTaken => Err(ShortenerError::AliasConflict(new_code.into_string())),
        }
    }

    /// Removes a mapping. Deleting a code twice fails the second time.
    pub async fn delete(&self, code: &ShortCode) -> Result<()> {
        if !self.repository.delete(code).await? {
            return Err(ShortenerError::NotFound(code.to_string()));
        }

        debug!(code = %code, "deleted short code");
        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<Mapping>> {
        Ok(self.repository.list_all().await?)
    }
}
