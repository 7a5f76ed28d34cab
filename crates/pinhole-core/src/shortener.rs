use crate::error::Result;
use crate::repository::Mapping;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// The write side of the engine: allocation and mutation of mappings.
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Allocates a fresh, globally unique short code for `target_url`.
    async fn allocate(&self, target_url: &str) -> Result<Mapping>;

    /// Replaces the target URL of an existing mapping.
    async fn update_target(&self, code: &ShortCode, new_url: &str) -> Result<Mapping>;

    /// Moves an existing mapping to a new short code.
    ///
    /// `new_code` is taken as a raw string so format validation is part of
    /// the operation's contract.
    async fn rename(&self, old_code: &ShortCode, new_code: &str) -> Result<Mapping>;

    /// Permanently removes a mapping.
    async fn delete(&self, code: &ShortCode) -> Result<()>;

    /// Lists every live mapping.
    async fn list_all(&self) -> Result<Vec<Mapping>>;
}

/// The read side of the engine.
#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a short code to its target URL and counts the access.
    async fn resolve(&self, code: &ShortCode) -> Result<String>;

    /// Returns the full mapping without counting an access.
    async fn stats(&self, code: &ShortCode) -> Result<Mapping>;
}
