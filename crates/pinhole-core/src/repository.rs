use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored short code mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// The short code that identifies this mapping.
    pub code: ShortCode,
    /// The URL the short code redirects to.
    pub target_url: String,
    /// When the mapping was allocated. Never changes.
    pub created_at: Timestamp,
    /// When the target URL or the code last changed.
    pub updated_at: Timestamp,
    /// Number of successful resolutions.
    pub access_count: u64,
}

impl Mapping {
    /// Creates a fresh mapping with a zero access count.
    pub fn new(code: ShortCode, target_url: impl Into<String>, now: Timestamp) -> Self {
        Self {
            code,
            target_url: target_url.into(),
            created_at: now,
            updated_at: now,
            access_count: 0,
        }
    }
}

/// Fields changed by [`Repository::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingPatch {
    /// Replacement target URL; `None` leaves the target untouched.
    pub target_url: Option<String>,
    /// The new `updated_at` value.
    pub updated_at: Timestamp,
}

impl MappingPatch {
    pub fn target(url: impl Into<String>, now: Timestamp) -> Self {
        Self {
            target_url: Some(url.into()),
            updated_at: now,
        }
    }

    /// A patch that only refreshes `updated_at`.
    pub fn touch(now: Timestamp) -> Self {
        Self {
            target_url: None,
            updated_at: now,
        }
    }

    /// Applies the patch to a mapping in place.
    pub fn apply(self, mapping: &mut Mapping) {
        if let Some(url) = self.target_url {
            mapping.target_url = url;
        }
        mapping.updated_at = self.updated_at;
    }
}

/// Outcome of an atomic [`Repository::rename_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The mapping now lives under the new code.
    Renamed(Mapping),
    /// No live mapping exists under the old code.
    SourceMissing,
    /// Another live mapping already uses the new code. Nothing changed.
    TargetTaken,
}

/// A read-only view of a mapping store.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the mapping for a given short code.
    /// Returns `None` if the code does not exist.
    async fn get(&self, code: &ShortCode) -> Result<Option<Mapping>>;

    /// Returns every live mapping, ordered by creation.
    ///
    /// The result is a single snapshot per call but makes no promise about
    /// mutations that run concurrently with it.
    async fn list_all(&self) -> Result<Vec<Mapping>>;
}

/// The full mapping store contract.
///
/// Every operation on a single code must be atomic with respect to the other
/// operations on the same code, including when several processes share the
/// backing store. Callers never check-then-act across two calls.
#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts the mapping only if its code is not already in use.
    /// Returns `false` without modifying anything on a collision.
    async fn insert_if_absent(&self, mapping: &Mapping) -> Result<bool>;

    /// Adds one to the access counter of the mapping and returns the mapping
    /// as it is after the change, read in the same atomic step.
    /// Returns `None` if the code does not exist.
    async fn atomic_increment(&self, code: &ShortCode) -> Result<Option<Mapping>>;

    /// Applies a patch and returns the mapping as it is after the change.
    /// Returns `None` if the code does not exist.
    async fn update(&self, code: &ShortCode, patch: MappingPatch) -> Result<Option<Mapping>>;

    /// Moves a mapping from `from` to `to` if `to` is free, setting
    /// `updated_at` to `now`. The access counter and `created_at` move with it.
    async fn rename_if_absent(
        &self,
        from: &ShortCode,
        to: &ShortCode,
        now: Timestamp,
    ) -> Result<RenameOutcome>;

    /// Deletes the mapping for a given short code.
    /// Returns `true` if the mapping existed and was removed.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;
}
