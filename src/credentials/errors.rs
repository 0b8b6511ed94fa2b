//! Credential store errors.

use sqlx::Error;
use thiserror::Error;

use crate::{credentials::CodecError, vault::VaultError};

/// Credential store failure taxonomy.
///
/// `NotFound` and `AuthenticationFailure` both terminate a request as
/// unauthorized at the boundary, but the distinction matters for logs: one
/// is an absent credential, the other a presented secret that did not match
/// the stored one.
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    /// Token, credential, or entity is absent.
    #[error("credential not found")]
    NotFound,

    /// The decoded secret does not match the stored secret.
    #[error("credential secret does not match")]
    AuthenticationFailure,

    /// Backend write/read inconsistency or an unexpected decode failure.
    #[error("internal credential store error: {0}")]
    Internal(String),

    /// Secret backend failure.
    #[error("secret backend error")]
    Backend(#[from] VaultError),

    /// Entity storage failure.
    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CredentialStoreError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Sql(error)
    }
}

impl From<CodecError> for CredentialStoreError {
    fn from(error: CodecError) -> Self {
        match error {
            // A token whose identifying claim is absent resolves to nothing.
            CodecError::MissingClaim(_) => Self::NotFound,
            // A structurally broken JWT should not occur with well-formed
            // inputs; surface it as a server-side failure.
            CodecError::Malformed => Self::Internal(error.to_string()),
        }
    }
}
