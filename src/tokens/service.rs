//! Token service: augments an externally issued token with tenant-derived
//! claims and re-signs it.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, Header};
use rustc_hash::FxHashSet;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::{
    credentials::{ClaimSet, CodecError, codec},
    identity::{IdentityError, IdentityService},
    keys::{KeyManager, KeyManagerError},
    tokens::cache::TokenCache,
};

/// Errors raised while re-issuing a token.
#[derive(Debug, Error)]
pub enum TokenServiceError {
    /// The inbound token could not be parsed as a JWT.
    #[error("inbound token is malformed")]
    Malformed(#[from] CodecError),

    /// Signing key unavailable.
    #[error("signing key unavailable")]
    Key(#[from] KeyManagerError),

    /// The claim set could not be signed.
    #[error("token signing failed")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Claims derived from the user's group memberships in a tenant.
#[derive(Debug, Clone)]
struct DerivedClaims {
    groups: Vec<String>,
    scopes: Vec<String>,
    scope: String,
}

/// Re-issues externally signed tokens with tenant-specific scopes.
pub struct TokenService {
    keys: Arc<KeyManager>,
    identity: Arc<dyn IdentityService>,
    cache: TokenCache,
    issuer_base: String,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &self.keys)
            .field("issuer_base", &self.issuer_base)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(
        keys: Arc<KeyManager>,
        identity: Arc<dyn IdentityService>,
        cache: TokenCache,
        issuer_base: impl Into<String>,
    ) -> Self {
        Self {
            keys,
            identity,
            cache,
            issuer_base: issuer_base.into(),
        }
    }

    /// Re-issue `token` with claims derived for `tenant_id`.
    ///
    /// Every claim of the original token is preserved except `groups`,
    /// `scope`, `scopes`, and `iss`, which are overwritten from the derived
    /// values. The original token is cached under the new token's `jti` and
    /// can be recovered via [`Self::get_original_token`].
    ///
    /// When claim derivation fails the original claim set is re-signed
    /// unmodified instead of failing the request.
    ///
    /// # Errors
    ///
    /// Returns an error when the inbound token is malformed, the signing key
    /// is unavailable, or signing fails.
    pub async fn generate_with_custom_claims(
        &self,
        token: &str,
        tenant_id: &str,
    ) -> Result<String, TokenServiceError> {
        let mut claims = codec::decode_payload(token)?;

        match self.derive_claims(&claims, tenant_id).await {
            Ok(derived) => {
                claims.insert("groups".to_string(), Value::from(derived.groups));
                claims.insert("scope".to_string(), Value::String(derived.scope));
                claims.insert("scopes".to_string(), Value::from(derived.scopes));
                claims.insert(
                    "iss".to_string(),
                    Value::String(format!("{}/{tenant_id}", self.issuer_base)),
                );
            }
            Err(error) => {
                // Availability over completeness: hand back a token without
                // derived scopes rather than rejecting the request.
                warn!(
                    %tenant_id,
                    %error,
                    "claim derivation failed; re-signing the original claim set"
                );
            }
        }

        let jti = Uuid::new_v4().to_string();
        claims.insert("jti".to_string(), Value::String(jti.clone()));

        let material = self.keys.signing_key().await?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(material.key_id.clone());
        header.typ = Some("JWT".to_string());

        let signed = jsonwebtoken::encode(&header, &claims, &material.encoding_key)?;

        self.cache.insert(jti, token);

        Ok(signed)
    }

    /// Recover the original upstream token behind a re-issued token.
    ///
    /// `None` when the token does not parse, carries no `jti`, or the cache
    /// entry has expired or been evicted.
    #[must_use]
    pub fn get_original_token(&self, token: &str) -> Option<String> {
        let claims = codec::decode_payload(token).ok()?;
        let jti = claims.get("jti")?.as_str()?;

        self.cache.get(jti)
    }

    async fn derive_claims(
        &self,
        claims: &ClaimSet,
        tenant_id: &str,
    ) -> Result<DerivedClaims, ClaimDerivationError> {
        let email = claims
            .get("email")
            .and_then(Value::as_str)
            .ok_or(ClaimDerivationError::MissingEmail)?;

        let existing_scope = claims
            .get("scope")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let user_groups = self.identity.get_groups_of_user(tenant_id, email).await?;

        let mut groups = Vec::with_capacity(user_groups.len());
        let mut scopes = Vec::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();

        for group in user_groups {
            groups.push(group.external_id);

            for role in group.roles {
                if seen.insert(role.clone()) {
                    scopes.push(role);
                }
            }
        }

        let mut scope_parts: Vec<String> =
            existing_scope.split_whitespace().map(str::to_string).collect();
        let mut scope_seen: FxHashSet<String> = scope_parts.iter().cloned().collect();

        for scope in &scopes {
            if scope_seen.insert(scope.clone()) {
                scope_parts.push(scope.clone());
            }
        }

        Ok(DerivedClaims {
            groups,
            scopes,
            scope: scope_parts.join(" "),
        })
    }
}

#[derive(Debug, Error)]
enum ClaimDerivationError {
    #[error("token carries no email claim")]
    MissingEmail,

    #[error(transparent)]
    Identity(#[from] IdentityError),
}
