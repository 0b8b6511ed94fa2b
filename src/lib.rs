//! Multi-tenant credential and token authorization core.
//!
//! Issues and validates scoped API credentials on behalf of independent
//! tenants, resolves inbound tokens into authorization claims, and enforces
//! tenant-hierarchy-aware access rules across five authentication modes.

pub mod authz;
pub mod config;
pub mod context;
pub mod credentials;
pub mod database;
pub mod identity;
pub mod keys;
pub mod tenants;
pub mod tokens;
pub mod vault;
