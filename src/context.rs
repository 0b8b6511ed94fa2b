//! App context: constructs and wires the service graph.

use std::{fmt, sync::Arc};

use jiff::SignedDuration;
use thiserror::Error;

use crate::{
    authz::TokenAuthorizer,
    config::AppConfig,
    credentials::{CredentialCodec, CredentialStore, PgCredentialEntityRepository, VaultCredentialStore},
    database,
    identity::IdentityService,
    keys::{KeyManager, KeyManagerError},
    tenants::TenantProfileService,
    tokens::{TokenCache, TokenService},
    vault::{SecretBackend, VaultConfig, VaultError, VaultKvClient},
};

/// Errors raised while building the application context.
#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to build secret backend client")]
    Vault(#[from] VaultError),

    #[error("failed to load signing key material")]
    Keys(#[from] KeyManagerError),

    #[error("token cache TTL is out of range")]
    CacheTtl,
}

/// The wired service graph.
///
/// The tenant-profile and identity collaborators live outside this crate and
/// are injected by the embedding service.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn CredentialStore>,
    pub keys: Arc<KeyManager>,
    pub tokens: Arc<TokenService>,
    pub authorizer: Arc<TokenAuthorizer>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build the context from configuration and the external collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error when the database connection, the secret backend
    /// client, or static key material cannot be established.
    pub async fn from_config(
        config: &AppConfig,
        tenants: Arc<dyn TenantProfileService>,
        identity: Arc<dyn IdentityService>,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(&config.database_url)
            .await
            .map_err(AppInitError::Database)?;

        let backend: Arc<dyn SecretBackend> = Arc::new(VaultKvClient::new(VaultConfig {
            addr: config.vault_addr.clone(),
            token: config.vault_token.clone(),
            mount: config.vault_mount.clone(),
            timeout: config.vault_timeout,
        })?);

        let store: Arc<dyn CredentialStore> = Arc::new(VaultCredentialStore::new(
            Arc::clone(&backend),
            Arc::new(PgCredentialEntityRepository::new(pool)),
            CredentialCodec::new(
                config.credential_prefix.clone(),
                config.credential_id_length,
                config.credential_secret_length,
            ),
            config.master_owner_id.clone(),
        ));

        let keys = match (&config.private_key_file, &config.public_key_file) {
            (Some(private_path), Some(public_path)) => {
                Arc::new(KeyManager::from_pem_files(private_path, public_path)?)
            }
            _ => Arc::new(KeyManager::new(
                Arc::clone(&backend),
                config.signing_key_path.clone(),
                config.rsa_key_size,
            )),
        };

        let ttl = SignedDuration::try_from(config.token_cache_ttl)
            .map_err(|_| AppInitError::CacheTtl)?;

        let tokens = Arc::new(TokenService::new(
            Arc::clone(&keys),
            Arc::clone(&identity),
            TokenCache::new(config.token_cache_capacity, ttl),
            config.issuer_base.clone(),
        ));

        let authorizer = Arc::new(TokenAuthorizer::new(
            Arc::clone(&store),
            tenants,
            identity,
        ));

        Ok(Self {
            store,
            keys,
            tokens,
            authorizer,
        })
    }
}
