//! Common test utilities and fixtures.

pub mod clients;
pub mod server;

#[allow(unused_imports)]
pub use clients::*;
#[allow(unused_imports)]
pub use server::*;
