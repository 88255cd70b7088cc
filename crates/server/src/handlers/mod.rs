//! HTTP request handlers.

pub mod download;
pub mod files;
pub mod health;

pub use download::*;
pub use files::*;
pub use health::*;
