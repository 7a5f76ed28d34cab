//! URL shortener service implementation.
//!
//! [`Allocator`] hands out fresh short codes, [`Mutator`] changes or removes
//! existing mappings, and [`ShortenerService`] combines both behind the
//! [`Shortener`](pinhole_core::Shortener) trait.

pub mod allocator;
pub mod mutation;
pub mod service;

pub use allocator::{Allocator, ShortenerSettings};
pub use mutation::Mutator;
pub use service::ShortenerService;
