//! Token decoding and credential material generation.
//!
//! JWT payloads are decoded here without cryptographic verification; the
//! trust boundary is the secret match against the backend-held credential,
//! performed by the store.

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD as BASE64_URL},
};
use rand::{Rng, rngs::OsRng};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::credentials::types::Credential;

/// A decoded JWT claim set.
pub type ClaimSet = Map<String, Value>;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Errors raised while decoding a JWT-shaped token.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The token does not split into the expected segments or a segment is
    /// not valid base64url JSON.
    #[error("token is malformed")]
    Malformed,

    /// A claim required to identify the caller is absent.
    #[error("token is missing required claim `{0}`")]
    MissingClaim(&'static str),
}

/// Generates credential id/secret pairs from configured lengths.
#[derive(Debug, Clone)]
pub struct CredentialCodec {
    prefix: String,
    id_length: usize,
    secret_length: usize,
}

/// Freshly generated credential material. Persisting it is the store's job.
#[derive(Debug, Clone)]
pub struct GeneratedCredential {
    pub id: String,
    pub secret: String,
}

impl CredentialCodec {
    #[must_use]
    pub fn new(prefix: impl Into<String>, id_length: usize, secret_length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            id_length,
            secret_length,
        }
    }

    /// Mint a candidate credential for `owner_id`.
    ///
    /// The id embeds the owner id, which makes it globally unique without a
    /// uniqueness constraint on the backend.
    #[must_use]
    pub fn generate(&self, owner_id: &str) -> GeneratedCredential {
        GeneratedCredential {
            id: format!(
                "{}{}-{owner_id}",
                self.prefix,
                random_token(self.id_length)
            ),
            secret: random_token(self.secret_length),
        }
    }
}

fn random_token(length: usize) -> String {
    let mut rng = OsRng;

    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Decode an opaque `base64(id:secret)` token.
///
/// Any malformation yields `None`; callers treat that as "credential not
/// found", never as a parse error.
#[must_use]
pub fn decode_opaque(token: &str) -> Option<Credential> {
    let decoded = BASE64.decode(token.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let mut parts = decoded.split(':');
    let id = parts.next()?;
    let secret = parts.next()?;

    if id.is_empty() || secret.is_empty() || parts.next().is_some() {
        return None;
    }

    Some(Credential {
        id: id.to_string(),
        secret: secret.to_string(),
        ..Credential::default()
    })
}

/// Decode the payload segment of a JWT without verifying its signature.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] when the token does not have three
/// segments or the payload is not base64url JSON.
pub fn decode_payload(token: &str) -> Result<ClaimSet, CodecError> {
    let mut segments = token.trim().split('.');

    let header = segments.next().ok_or(CodecError::Malformed)?;
    let payload = segments.next().ok_or(CodecError::Malformed)?;

    // The signature segment is present but deliberately not verified here.
    let _signature = segments.next().ok_or(CodecError::Malformed)?;

    if segments.next().is_some() {
        return Err(CodecError::Malformed);
    }

    decode_segment(header)?;

    match decode_segment(payload)? {
        Value::Object(claims) => Ok(claims),
        _ => Err(CodecError::Malformed),
    }
}

fn decode_segment(segment: &str) -> Result<Value, CodecError> {
    let bytes = BASE64_URL
        .decode(segment.trim_end_matches('='))
        .map_err(|_| CodecError::Malformed)?;

    serde_json::from_slice(&bytes).map_err(|_| CodecError::Malformed)
}

/// Decode a user JWT into a credential.
///
/// Extracts `azp` as the client id, the optional `email` and
/// `preferred_username`, and sets the admin flag when `realm_access.roles`
/// contains `"admin"`.
///
/// # Errors
///
/// Fails when the token is malformed or the `azp` claim is missing.
pub fn decode_jwt(token: &str) -> Result<Credential, CodecError> {
    let claims = decode_payload(token)?;

    let id = claims
        .get("azp")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingClaim("azp"))?
        .to_string();

    let admin = claims
        .get("realm_access")
        .and_then(|access| access.get("roles"))
        .and_then(Value::as_array)
        .is_some_and(|roles| roles.iter().any(|role| role.as_str() == Some("admin")));

    Ok(Credential {
        id,
        email: string_claim(&claims, "email"),
        username: string_claim(&claims, "preferred_username"),
        admin,
        ..Credential::default()
    })
}

/// Decode an agent JWT into a credential.
///
/// # Errors
///
/// Fails when the token is malformed or the `agent-id` claim is missing.
pub fn decode_agent_jwt(token: &str) -> Result<Credential, CodecError> {
    let claims = decode_payload(token)?;

    let id = claims
        .get("agent-id")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingClaim("agent-id"))?
        .to_string();

    Ok(Credential {
        id,
        parent_id: string_claim(&claims, "agent-parent-id"),
        ..Credential::default()
    })
}

fn string_claim(claims: &ClaimSet, name: &str) -> Option<String> {
    claims
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
}
