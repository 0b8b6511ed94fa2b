//! Resolved authorization claims.

use std::fmt;

use jiff::Timestamp;

use crate::credentials::{CredentialMetadata, CredentialType, ResolvedCredentials};

/// The tenant's primary credential as carried by a claim.
#[derive(Clone)]
pub struct PrimaryCredential {
    pub id: String,
    pub secret: String,
    pub issued_at: Option<Timestamp>,
    pub expired_at: Option<Timestamp>,
    pub admin: bool,
    pub super_tenant: bool,
}

impl fmt::Debug for PrimaryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryCredential")
            .field("id", &self.id)
            .field("secret", &"**redacted**")
            .field("issued_at", &self.issued_at)
            .field("expired_at", &self.expired_at)
            .field("admin", &self.admin)
            .field("super_tenant", &self.super_tenant)
            .finish()
    }
}

/// A non-primary credential slot carried by a claim.
#[derive(Clone)]
pub struct ServiceAccount {
    pub id: String,
    pub secret: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("id", &self.id)
            .field("secret", &"**redacted**")
            .finish()
    }
}

/// The resolved authorization result for one request.
///
/// Constructed fresh per request and never persisted. Which slots are
/// populated depends on the credential types present under the tenant.
#[derive(Debug, Clone, Default)]
pub struct AuthClaim {
    pub tenant_id: String,
    pub username: String,
    pub performed_by: String,
    pub custos: Option<PrimaryCredential>,
    pub iam: Option<ServiceAccount>,
    pub cilogon: Option<ServiceAccount>,
    pub agent_client: Option<ServiceAccount>,
    pub agent: Option<ServiceAccount>,
}

impl AuthClaim {
    /// Build a claim from a tenant's resolved credential set.
    #[must_use]
    pub fn from_resolved(resolved: &ResolvedCredentials) -> Self {
        let username = resolved.requester_username.clone().unwrap_or_default();

        Self {
            username: username.clone(),
            performed_by: username,
            ..Self::from_metadata(&resolved.owner_id, &resolved.credentials)
        }
    }

    /// Build a claim from bare credential metadata for a tenant.
    #[must_use]
    pub fn from_metadata(owner_id: &str, credentials: &[CredentialMetadata]) -> Self {
        let mut claim = Self {
            tenant_id: owner_id.to_string(),
            ..Self::default()
        };

        for metadata in credentials {
            match metadata.credential_type {
                CredentialType::Custos => {
                    claim.custos = Some(PrimaryCredential {
                        id: metadata.id.clone(),
                        secret: metadata.secret.clone(),
                        issued_at: metadata.client_id_issued_at,
                        expired_at: metadata.client_secret_expired_at,
                        admin: metadata.super_admin,
                        super_tenant: metadata.super_tenant,
                    });
                }
                CredentialType::Iam => claim.iam = Some(service_account(metadata)),
                CredentialType::CiLogon => claim.cilogon = Some(service_account(metadata)),
                CredentialType::AgentClient => {
                    claim.agent_client = Some(service_account(metadata));
                }
                CredentialType::Agent => claim.agent = Some(service_account(metadata)),
            }
        }

        claim
    }

    /// Whether this claim belongs to the platform super-tenant.
    #[must_use]
    pub fn is_super_tenant(&self) -> bool {
        self.custos
            .as_ref()
            .is_some_and(|credential| credential.super_tenant)
    }
}

fn service_account(metadata: &CredentialMetadata) -> ServiceAccount {
    ServiceAccount {
        id: metadata.id.clone(),
        secret: metadata.secret.clone(),
    }
}
