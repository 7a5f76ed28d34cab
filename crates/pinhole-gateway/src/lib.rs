//! HTTP surface for the Pinhole URL shortener.
//!
//! The gateway maps JSON requests onto the [`Shortener`](pinhole_core::Shortener)
//! and [`Redirector`](pinhole_core::Redirector) traits and serves the public
//! `GET /{code}` redirect. It holds no state of its own.

pub mod app;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
