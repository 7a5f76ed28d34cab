//! Mapping store implementations.
//!
//! [`InMemoryRepository`] keeps everything in process memory and suits tests
//! and single-instance deployments. [`MySqlRepository`] is the durable store
//! that several service instances can share.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use pinhole_core::{Mapping, MappingPatch, ReadRepository, RenameOutcome, Repository, StorageError};
