//! Resolver for the Pinhole URL shortener.
//!
//! [`RedirectorService`] turns short codes back into target URLs and keeps
//! the per-code access counter up to date.
//!
//! # Example
//!
//! ```rust
//! use pinhole_core::{Mapping, Repository, ShortCode};
//! use pinhole_redirector::RedirectorService;
//! use pinhole_storage::InMemoryRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = InMemoryRepository::new();
//! let code = ShortCode::new("abc123")?;
//! repo.insert_if_absent(&Mapping::new(code.clone(), "https://example.com", jiff::Timestamp::now()))
//!     .await?;
//!
//! let service = RedirectorService::new(repo);
//! let url = service.resolve(&code).await?;
//! assert_eq!(url, "https://example.com");
//! # Ok(())
//! # }
//! ```

pub mod service;

pub use service::RedirectorService;
