//! Tenant profile collaborator seam.
//!
//! Tenant CRUD lives in an external service; only the lookup needed for
//! hierarchy and status checks is consumed here.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

/// Tenant lifecycle status. Only `Active` tenants may be resolved as child
/// tenants during authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantStatus {
    Active,
    Requested,
    Deactivated,
}

impl TenantStatus {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// External tenant entity, referenced by id.
///
/// The hierarchy is one parent per tenant; authorization only ever considers
/// "same tenant" or "direct parent-child", never transitive ancestry.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub tenant_id: String,
    pub parent_tenant_id: Option<String>,
    pub status: TenantStatus,
}

/// Errors from the tenant profile collaborator.
#[derive(Debug, Error)]
pub enum TenantProfileError {
    #[error("tenant profile lookup failed: {0}")]
    Lookup(String),
}

/// Read access to tenant profiles.
#[automock]
#[async_trait]
pub trait TenantProfileService: Send + Sync {
    /// Fetch a tenant by id, or `None` when it does not exist.
    async fn get_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, TenantProfileError>;
}
