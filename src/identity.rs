//! Identity and group collaborator seam.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

/// Minimal claim set handed to the external authentication check.
#[derive(Debug, Clone)]
pub struct UserClaims {
    pub username: String,
    pub tenant_id: String,
}

/// A group the user belongs to within a tenant, with the roles attached to
/// that group.
#[derive(Debug, Clone)]
pub struct UserGroup {
    pub external_id: String,
    pub roles: Vec<String>,
}

/// Errors from the identity collaborator.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity service call failed: {0}")]
    Upstream(String),
}

/// External identity provider operations consumed by this crate.
#[automock]
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Confirm that a user token is still valid upstream.
    async fn is_authenticated(
        &self,
        token: &str,
        claims: &UserClaims,
    ) -> Result<bool, IdentityError>;

    /// Group memberships of a user within a tenant.
    async fn get_groups_of_user(
        &self,
        tenant_id: &str,
        username: &str,
    ) -> Result<Vec<UserGroup>, IdentityError>;
}
