//! Credential storage, decoding, and typed metadata.

pub mod codec;
mod errors;
mod repository;
mod service;
mod types;

pub use codec::*;
pub use errors::*;
pub use repository::*;
pub use service::*;
pub use types::*;
