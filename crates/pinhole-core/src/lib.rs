//! Core types and traits for the Pinhole URL shortener.
//!
//! This crate provides the shared vocabulary used by the allocation engine,
//! the resolver and every mapping store: short codes, mapping records, the
//! repository contract and the error taxonomy.

pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use error::{ShortenerError, StorageError};
pub use repository::{Mapping, MappingPatch, ReadRepository, RenameOutcome, Repository};
pub use shortcode::ShortCode;
pub use shortener::{Redirector, Shortener};
