//! Authorizer errors and failure normalization.

use thiserror::Error;
use tracing::debug;

use crate::{
    credentials::CredentialStoreError, identity::IdentityError, tenants::TenantProfileError,
};

/// Caller-visible authorization outcome.
#[derive(Debug, Error)]
pub enum AuthorizerError {
    /// The request was rejected. Covers absent credentials, secret
    /// mismatches, failed hierarchy checks, and upstream rejection; the
    /// distinction is logged, not surfaced.
    #[error("request is not authorized")]
    Unauthorized,

    /// A server-side failure unrelated to the caller's credentials.
    #[error("internal authorization error: {0}")]
    Internal(String),
}

/// Internal failure carried between mode handlers before normalization.
#[derive(Debug, Error)]
pub(crate) enum AuthFailure {
    #[error(transparent)]
    Store(#[from] CredentialStoreError),

    #[error(transparent)]
    Tenant(#[from] TenantProfileError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("upstream authentication check rejected the token")]
    Unauthenticated,
}

impl AuthFailure {
    /// Collapse to the caller-visible outcome, logging the detail first.
    pub(crate) fn normalize(self) -> AuthorizerError {
        match self {
            Self::Store(
                error @ (CredentialStoreError::Internal(_)
                | CredentialStoreError::Backend(_)
                | CredentialStoreError::Sql(_)),
            ) => AuthorizerError::Internal(error.to_string()),
            Self::Tenant(error) => AuthorizerError::Internal(error.to_string()),
            Self::Store(error) => {
                // NotFound and AuthenticationFailure both reject the request,
                // but operators need to tell them apart.
                debug!(%error, "credential resolution rejected the request");
                AuthorizerError::Unauthorized
            }
            Self::Identity(error) => {
                debug!(%error, "identity collaborator rejected the request");
                AuthorizerError::Unauthorized
            }
            Self::Unauthenticated => AuthorizerError::Unauthorized,
        }
    }
}
