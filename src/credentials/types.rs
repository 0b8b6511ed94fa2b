//! Credential data models.

use std::fmt;

use jiff::Timestamp;
use serde_json::Value;

use crate::vault::SecretData;

/// Closed set of credential slots stored under a tenant's path.
///
/// Backend listings may contain keys unrelated to credentials; anything that
/// does not match one of these names is skipped, never mis-filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialType {
    /// The tenant's primary identity credential. Exactly one canonical
    /// CUSTOS credential represents the tenant.
    Custos,

    /// IdP service-account credential.
    Iam,

    /// External login provider credential.
    CiLogon,

    /// Agent credential (non-human caller).
    Agent,

    /// Agent client credential.
    AgentClient,
}

impl CredentialType {
    /// All known credential types, in listing order.
    pub const ALL: [Self; 5] = [
        Self::Custos,
        Self::Iam,
        Self::CiLogon,
        Self::Agent,
        Self::AgentClient,
    ];

    /// The storage path segment for this type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Custos => "CUSTOS",
            Self::Iam => "IAM",
            Self::CiLogon => "CILOGON",
            Self::Agent => "AGENT",
            Self::AgentClient => "AGENT_CLIENT",
        }
    }

    /// Parse a storage key name. Unknown names are `None` and callers skip
    /// them.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CUSTOS" => Some(Self::Custos),
            "IAM" => Some(Self::Iam),
            "CILOGON" => Some(Self::CiLogon),
            "AGENT" => Some(Self::Agent),
            "AGENT_CLIENT" => Some(Self::AgentClient),
            _ => None,
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transient credential value decoded from a token or destined for storage.
///
/// Never persisted directly; it is the payload stored at or read from a
/// secret-backend path.
#[derive(Clone, Default)]
pub struct Credential {
    pub id: String,
    pub secret: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub parent_id: Option<String>,
    pub admin: bool,
    pub super_tenant: bool,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("secret", &"**redacted**")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("parent_id", &self.parent_id)
            .field("admin", &self.admin)
            .field("super_tenant", &self.super_tenant)
            .finish()
    }
}

impl Credential {
    /// Serialize the storable fields into a secret-backend payload.
    #[must_use]
    pub fn to_secret_data(&self) -> SecretData {
        let mut data = SecretData::new();

        data.insert("id".to_string(), Value::String(self.id.clone()));
        data.insert("secret".to_string(), Value::String(self.secret.clone()));
        data.insert("super_tenant".to_string(), Value::Bool(self.super_tenant));

        data
    }

    /// Deserialize a secret-backend payload back into a credential.
    ///
    /// Returns `None` when the payload does not carry the expected fields.
    #[must_use]
    pub fn from_secret_data(data: &SecretData) -> Option<Self> {
        let id = data.get("id")?.as_str()?.to_string();
        let secret = data.get("secret")?.as_str()?.to_string();
        let super_tenant = data
            .get("super_tenant")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Some(Self {
            id,
            secret,
            super_tenant,
            ..Self::default()
        })
    }
}

/// Durable record keyed by client id.
///
/// Provides the reverse index from an opaque client id to its owning tenant;
/// the secret backend itself is not queryable by value.
#[derive(Debug, Clone)]
pub struct CredentialEntity {
    pub client_id: String,
    pub owner_id: String,
    pub credential_type: CredentialType,
    pub issued_at: Timestamp,
    pub client_secret_expired_at: Option<Timestamp>,
}

/// Credential entity persistence payload.
#[derive(Debug, Clone)]
pub struct NewCredentialEntity {
    pub client_id: String,
    pub owner_id: String,
    pub credential_type: CredentialType,
    pub client_secret_expired_at: Option<Timestamp>,
}

/// The resolved, typed view of a stored credential returned to callers.
#[derive(Clone)]
pub struct CredentialMetadata {
    pub owner_id: String,
    pub id: String,
    pub secret: String,
    pub credential_type: CredentialType,
    pub client_id_issued_at: Option<Timestamp>,
    pub client_secret_expired_at: Option<Timestamp>,
    pub super_admin: bool,
    pub super_tenant: bool,
}

impl fmt::Debug for CredentialMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialMetadata")
            .field("owner_id", &self.owner_id)
            .field("id", &self.id)
            .field("secret", &"**redacted**")
            .field("credential_type", &self.credential_type)
            .field("client_id_issued_at", &self.client_id_issued_at)
            .field("client_secret_expired_at", &self.client_secret_expired_at)
            .field("super_admin", &self.super_admin)
            .field("super_tenant", &self.super_tenant)
            .finish()
    }
}

impl CredentialMetadata {
    /// Build metadata from a stored credential payload.
    #[must_use]
    pub fn from_credential(
        owner_id: &str,
        credential_type: CredentialType,
        credential: &Credential,
    ) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            id: credential.id.clone(),
            secret: credential.secret.clone(),
            credential_type,
            client_id_issued_at: None,
            client_secret_expired_at: None,
            super_admin: false,
            super_tenant: credential.super_tenant,
        }
    }
}

/// All credential metadata resolved for one tenant, plus the requester
/// identity when the resolution started from a JWT.
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    pub owner_id: String,
    pub requester_username: Option<String>,
    pub requester_email: Option<String>,
    pub credentials: Vec<CredentialMetadata>,
}

impl ResolvedCredentials {
    /// The credential stored in the given type slot, if present.
    #[must_use]
    pub fn of_type(&self, credential_type: CredentialType) -> Option<&CredentialMetadata> {
        self.credentials
            .iter()
            .find(|credential| credential.credential_type == credential_type)
    }

    /// The tenant's primary credential, if present.
    #[must_use]
    pub fn custos(&self) -> Option<&CredentialMetadata> {
        self.of_type(CredentialType::Custos)
    }
}

/// Flattened id/secret view over the CUSTOS, IAM, and CILOGON slots.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    pub owner_id: String,
    pub custos_id: String,
    pub custos_secret: String,
    pub custos_issued_at: Option<Timestamp>,
    pub custos_expired_at: Option<Timestamp>,
    pub iam: Option<ClientPair>,
    pub cilogon: Option<ClientPair>,
}

/// A bare client id and secret pair.
#[derive(Clone)]
pub struct ClientPair {
    pub id: String,
    pub secret: String,
}

impl fmt::Debug for ClientPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientPair")
            .field("id", &self.id)
            .field("secret", &"**redacted**")
            .finish()
    }
}
