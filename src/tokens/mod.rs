//! Token re-issuance with tenant-derived claims.

mod cache;
mod service;

pub use cache::*;
pub use service::*;
