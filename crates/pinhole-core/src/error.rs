use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, ShortenerError>;

/// Failures reported by a mapping store.
///
/// Stores never use this type to signal "not found" or "already exists";
/// those outcomes are part of each operation's return value.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// Errors returned by the allocation engine, the resolver and the mutation service.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("alias already exists: {0}")]
    AliasConflict(String),
    #[error("no free short code found after {attempts} attempts")]
    Exhausted { attempts: usize },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ShortenerError {
    /// Returns `true` for bad caller input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidUrl(_) | Self::InvalidShortCode(_))
    }

    /// Returns `true` if the caller may retry the same request unchanged.
    ///
    /// Exhaustion is retryable because a fresh run draws new candidates.
    /// Retrying a rename or delete is only safe after checking its
    /// post-condition: a committed-but-unacknowledged rename reports
    /// `AliasConflict` on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Exhausted { .. }
                | Self::Storage(StorageError::Unavailable(_) | StorageError::Timeout(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(ShortenerError::InvalidUrl("".into()).is_validation());
        assert!(ShortenerError::InvalidShortCode("".into()).is_validation());
        assert!(!ShortenerError::NotFound("abc".into()).is_validation());

        assert!(ShortenerError::Exhausted { attempts: 10 }.is_retryable());
        assert!(ShortenerError::Storage(StorageError::Timeout("slow".into())).is_retryable());
        assert!(!ShortenerError::Storage(StorageError::Query("syntax".into())).is_retryable());
        assert!(!ShortenerError::AliasConflict("abc".into()).is_retryable());
    }

    #[test]
    fn storage_error_is_transparent() {
        let err: ShortenerError = StorageError::Unavailable("pool closed".into()).into();
        assert_eq!(err.to_string(), "storage backend unavailable: pool closed");
    }
}
