//! Credential store service.
//!
//! Typed CRUD over the secret backend plus the "resolve from token" queries
//! used by the authorizer. The canonical CUSTOS secret match performed here
//! is the trust boundary for every token-based resolution.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::debug;

use crate::{
    credentials::{
        codec::{self, CredentialCodec},
        errors::CredentialStoreError,
        repository::CredentialEntityRepository,
        types::{
            BasicCredentials, ClientPair, Credential, CredentialEntity, CredentialMetadata,
            CredentialType, NewCredentialEntity, ResolvedCredentials,
        },
    },
    vault::SecretBackend,
};

/// Typed credential CRUD and token resolution operations.
#[automock]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a credential in the given type slot, verified by read-back.
    async fn put_credential(
        &self,
        owner_id: &str,
        credential_type: CredentialType,
        id: &str,
        secret: &str,
        super_tenant: bool,
    ) -> Result<(), CredentialStoreError>;

    /// Read the credential in the given type slot, if present.
    async fn get_credential(
        &self,
        owner_id: &str,
        credential_type: CredentialType,
    ) -> Result<Option<CredentialMetadata>, CredentialStoreError>;

    /// Read every known-typed credential stored under the tenant.
    async fn get_all_credentials(
        &self,
        owner_id: &str,
    ) -> Result<Vec<CredentialMetadata>, CredentialStoreError>;

    /// Delete one type slot, or the tenant's whole credential subtree.
    /// Deleting the CUSTOS slot also removes its entity row.
    async fn delete_credential(
        &self,
        owner_id: &str,
        credential_type: Option<CredentialType>,
    ) -> Result<(), CredentialStoreError>;

    /// Mint, store, and persist a fresh primary credential for the tenant.
    ///
    /// Not idempotent: every call produces a new credential and entity row.
    async fn generate_custos_credential(
        &self,
        owner_id: &str,
    ) -> Result<CredentialMetadata, CredentialStoreError>;

    /// Resolve the owning tenant of an opaque token.
    async fn owner_id_from_token(&self, token: &str) -> Result<String, CredentialStoreError>;

    /// Resolve and secret-match the primary credential behind an opaque token.
    async fn custos_credential_from_token(
        &self,
        token: &str,
    ) -> Result<CredentialMetadata, CredentialStoreError>;

    /// Resolve the primary credential for a known client id.
    async fn custos_credential_from_client_id(
        &self,
        client_id: &str,
    ) -> Result<CredentialMetadata, CredentialStoreError>;

    /// Resolve all credentials of the tenant owning an opaque token,
    /// secret-matched against the CUSTOS slot.
    async fn all_credentials_from_token(
        &self,
        token: &str,
    ) -> Result<ResolvedCredentials, CredentialStoreError>;

    /// Resolve all credentials of the tenant behind a user JWT, carrying the
    /// requester identity and merging the decoded admin flag onto the CUSTOS
    /// entry.
    async fn all_credentials_from_jwt(
        &self,
        token: &str,
    ) -> Result<ResolvedCredentials, CredentialStoreError>;

    /// Flattened CUSTOS/IAM/CILOGON view behind an opaque token.
    async fn basic_credentials(
        &self,
        token: &str,
    ) -> Result<BasicCredentials, CredentialStoreError>;

    /// All credential metadata under the fixed master tenant slot.
    async fn master_credentials(&self) -> Result<Vec<CredentialMetadata>, CredentialStoreError>;
}

/// Secret-backend-backed credential store.
pub struct VaultCredentialStore {
    backend: Arc<dyn SecretBackend>,
    entities: Arc<dyn CredentialEntityRepository>,
    codec: CredentialCodec,
    master_owner_id: String,
}

impl VaultCredentialStore {
    #[must_use]
    pub fn new(
        backend: Arc<dyn SecretBackend>,
        entities: Arc<dyn CredentialEntityRepository>,
        codec: CredentialCodec,
        master_owner_id: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            entities,
            codec,
            master_owner_id: master_owner_id.into(),
        }
    }

    fn credential_path(owner_id: &str, credential_type: CredentialType) -> String {
        format!("{owner_id}/{}", credential_type.name())
    }

    async fn read_credential(
        &self,
        owner_id: &str,
        credential_type: CredentialType,
    ) -> Result<Option<Credential>, CredentialStoreError> {
        let path = Self::credential_path(owner_id, credential_type);

        let Some(data) = self.backend.read(&path).await? else {
            return Ok(None);
        };

        match Credential::from_secret_data(&data) {
            Some(credential) => Ok(Some(credential)),
            None => Err(CredentialStoreError::Internal(format!(
                "stored payload at {path} is not a credential"
            ))),
        }
    }

    /// Entity row lookup that enriches metadata with issuance timestamps.
    fn apply_entity(metadata: &mut CredentialMetadata, entity: &CredentialEntity) {
        metadata.client_id_issued_at = Some(entity.issued_at);
        metadata.client_secret_expired_at = entity.client_secret_expired_at;
    }

    async fn resolve_entity(
        &self,
        client_id: &str,
    ) -> Result<CredentialEntity, CredentialStoreError> {
        self.entities
            .find_by_client_id(client_id)
            .await?
            .ok_or(CredentialStoreError::NotFound)
    }

    /// Resolve the entity behind an opaque token and verify the presented
    /// secret against the stored canonical CUSTOS secret.
    async fn verify_opaque(
        &self,
        token: &str,
    ) -> Result<(CredentialEntity, CredentialMetadata), CredentialStoreError> {
        let decoded = codec::decode_opaque(token).ok_or(CredentialStoreError::NotFound)?;
        let entity = self.resolve_entity(&decoded.id).await?;

        let stored = self
            .read_credential(&entity.owner_id, CredentialType::Custos)
            .await?
            .ok_or(CredentialStoreError::NotFound)?;

        if stored.secret != decoded.secret {
            debug!(
                owner_id = %entity.owner_id,
                client_id = %decoded.id,
                "presented secret does not match the stored CUSTOS secret"
            );

            return Err(CredentialStoreError::AuthenticationFailure);
        }

        let mut metadata = CredentialMetadata::from_credential(
            &entity.owner_id,
            CredentialType::Custos,
            &stored,
        );
        Self::apply_entity(&mut metadata, &entity);

        Ok((entity, metadata))
    }

    async fn delete_slot(
        &self,
        owner_id: &str,
        credential_type: CredentialType,
    ) -> Result<(), CredentialStoreError> {
        // The reverse index must not outlive the secret it points at.
        if credential_type == CredentialType::Custos {
            if let Some(stored) = self.read_credential(owner_id, credential_type).await? {
                self.entities.delete_by_client_id(&stored.id).await?;
            }
        }

        self.backend
            .delete(&Self::credential_path(owner_id, credential_type))
            .await?;

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for VaultCredentialStore {
    async fn put_credential(
        &self,
        owner_id: &str,
        credential_type: CredentialType,
        id: &str,
        secret: &str,
        super_tenant: bool,
    ) -> Result<(), CredentialStoreError> {
        let path = Self::credential_path(owner_id, credential_type);

        let credential = Credential {
            id: id.to_string(),
            secret: secret.to_string(),
            super_tenant,
            ..Credential::default()
        };

        self.backend
            .write(&path, &credential.to_secret_data())
            .await?;

        // The write is only trusted once the read-back observes it.
        let stored = self
            .read_credential(owner_id, credential_type)
            .await?
            .ok_or_else(|| {
                CredentialStoreError::Internal(format!("read-back after write to {path} is empty"))
            })?;

        if stored.id != credential.id || stored.secret != credential.secret {
            return Err(CredentialStoreError::Internal(format!(
                "read-back after write to {path} does not match the written value"
            )));
        }

        Ok(())
    }

    async fn get_credential(
        &self,
        owner_id: &str,
        credential_type: CredentialType,
    ) -> Result<Option<CredentialMetadata>, CredentialStoreError> {
        let Some(credential) = self.read_credential(owner_id, credential_type).await? else {
            return Ok(None);
        };

        let mut metadata =
            CredentialMetadata::from_credential(owner_id, credential_type, &credential);

        if credential_type == CredentialType::Custos {
            if let Some(entity) = self.entities.find_by_client_id(&credential.id).await? {
                Self::apply_entity(&mut metadata, &entity);
            }
        }

        Ok(Some(metadata))
    }

    async fn get_all_credentials(
        &self,
        owner_id: &str,
    ) -> Result<Vec<CredentialMetadata>, CredentialStoreError> {
        let keys = self.backend.list(owner_id).await?;
        let mut credentials = Vec::new();

        for key in keys {
            let name = key.trim_end_matches('/');

            // Backend paths unrelated to credentials are tolerated and skipped.
            let Some(credential_type) = CredentialType::from_name(name) else {
                continue;
            };

            if let Some(metadata) = self.get_credential(owner_id, credential_type).await? {
                credentials.push(metadata);
            }
        }

        Ok(credentials)
    }

    async fn delete_credential(
        &self,
        owner_id: &str,
        credential_type: Option<CredentialType>,
    ) -> Result<(), CredentialStoreError> {
        match credential_type {
            Some(credential_type) => {
                self.delete_slot(owner_id, credential_type).await?;
            }
            None => {
                for key in self.backend.list(owner_id).await? {
                    let name = key.trim_end_matches('/');

                    if let Some(credential_type) = CredentialType::from_name(name) {
                        self.delete_slot(owner_id, credential_type).await?;
                    }
                }
            }
        }

        Ok(())
    }

    async fn generate_custos_credential(
        &self,
        owner_id: &str,
    ) -> Result<CredentialMetadata, CredentialStoreError> {
        let generated = self.codec.generate(owner_id);

        self.put_credential(
            owner_id,
            CredentialType::Custos,
            &generated.id,
            &generated.secret,
            false,
        )
        .await?;

        let entity = self
            .entities
            .insert(&NewCredentialEntity {
                client_id: generated.id.clone(),
                owner_id: owner_id.to_string(),
                credential_type: CredentialType::Custos,
                client_secret_expired_at: None,
            })
            .await
            .map_err(CredentialStoreError::Sql)?;

        let mut metadata = CredentialMetadata::from_credential(
            owner_id,
            CredentialType::Custos,
            &Credential {
                id: generated.id,
                secret: generated.secret,
                ..Credential::default()
            },
        );
        Self::apply_entity(&mut metadata, &entity);

        Ok(metadata)
    }

    async fn owner_id_from_token(&self, token: &str) -> Result<String, CredentialStoreError> {
        let decoded = codec::decode_opaque(token).ok_or(CredentialStoreError::NotFound)?;
        let entity = self.resolve_entity(&decoded.id).await?;

        Ok(entity.owner_id)
    }

    async fn custos_credential_from_token(
        &self,
        token: &str,
    ) -> Result<CredentialMetadata, CredentialStoreError> {
        let (_, metadata) = self.verify_opaque(token).await?;

        Ok(metadata)
    }

    async fn custos_credential_from_client_id(
        &self,
        client_id: &str,
    ) -> Result<CredentialMetadata, CredentialStoreError> {
        let entity = self.resolve_entity(client_id).await?;

        let stored = self
            .read_credential(&entity.owner_id, CredentialType::Custos)
            .await?
            .ok_or(CredentialStoreError::NotFound)?;

        let mut metadata = CredentialMetadata::from_credential(
            &entity.owner_id,
            CredentialType::Custos,
            &stored,
        );
        Self::apply_entity(&mut metadata, &entity);

        Ok(metadata)
    }

    async fn all_credentials_from_token(
        &self,
        token: &str,
    ) -> Result<ResolvedCredentials, CredentialStoreError> {
        let (entity, _) = self.verify_opaque(token).await?;
        let credentials = self.get_all_credentials(&entity.owner_id).await?;

        Ok(ResolvedCredentials {
            owner_id: entity.owner_id,
            requester_username: None,
            requester_email: None,
            credentials,
        })
    }

    async fn all_credentials_from_jwt(
        &self,
        token: &str,
    ) -> Result<ResolvedCredentials, CredentialStoreError> {
        let decoded = codec::decode_jwt(token)?;
        let entity = self.resolve_entity(&decoded.id).await?;

        let mut credentials = self.get_all_credentials(&entity.owner_id).await?;

        for metadata in &mut credentials {
            if metadata.credential_type == CredentialType::Custos {
                metadata.super_admin = decoded.admin;
                Self::apply_entity(metadata, &entity);
            }
        }

        Ok(ResolvedCredentials {
            owner_id: entity.owner_id,
            requester_username: decoded.username.clone(),
            requester_email: decoded.email.clone(),
            credentials,
        })
    }

    async fn basic_credentials(
        &self,
        token: &str,
    ) -> Result<BasicCredentials, CredentialStoreError> {
        let resolved = self.all_credentials_from_token(token).await?;

        let custos = resolved.custos().ok_or(CredentialStoreError::NotFound)?;

        let pair = |credential_type| {
            resolved.of_type(credential_type).map(|m| ClientPair {
                id: m.id.clone(),
                secret: m.secret.clone(),
            })
        };

        Ok(BasicCredentials {
            owner_id: resolved.owner_id.clone(),
            custos_id: custos.id.clone(),
            custos_secret: custos.secret.clone(),
            custos_issued_at: custos.client_id_issued_at,
            custos_expired_at: custos.client_secret_expired_at,
            iam: pair(CredentialType::Iam),
            cilogon: pair(CredentialType::CiLogon),
        })
    }

    async fn master_credentials(&self) -> Result<Vec<CredentialMetadata>, CredentialStoreError> {
        self.get_all_credentials(&self.master_owner_id).await
    }
}
