//! Request authorization: mode selection, hierarchy checks, and claims.

mod authorizer;
mod claim;
mod errors;
mod mode;

pub use authorizer::*;
pub use claim::*;
pub use errors::*;
pub use mode::*;
