//! HTTP download gateway for the sluice statistics-publishing platform.
//!
//! This crate provides the serving plane:
//! - Admission control bounding concurrent downloads
//! - Caller identity resolution (user and service tokens)
//! - Download resolution against the metadata upstreams
//! - Redirect-or-stream serving with decrypt-on-read for private objects

pub mod admission;
pub mod auth;
pub mod content;
pub mod downloads;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use admission::AdmissionGate;
pub use content::Streamer;
pub use downloads::Resolver;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
