//! Application configuration.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Recognized configuration surface, loadable from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string for the credential entity store.
    pub database_url: String,

    /// Secret backend address.
    pub vault_addr: String,

    /// Secret backend authentication token.
    pub vault_token: String,

    /// KV v2 mount holding credential paths.
    pub vault_mount: String,

    /// Timeout applied to every secret backend call.
    pub vault_timeout: Duration,

    /// Prefix for generated credential ids.
    pub credential_prefix: String,

    /// Length of the random id body.
    pub credential_id_length: usize,

    /// Length of the random secret.
    pub credential_secret_length: usize,

    /// Owner id of the fixed master credential slot.
    pub master_owner_id: String,

    /// Backend path holding the token signing keypair.
    pub signing_key_path: String,

    /// RSA modulus size for lazily generated signing keys.
    pub rsa_key_size: usize,

    /// Static key material files; when both are set the lazy generate
    /// strategy is not used.
    pub private_key_file: Option<PathBuf>,
    pub public_key_file: Option<PathBuf>,

    /// Issuer base for re-issued tokens; the tenant id is appended.
    pub issuer_base: String,

    /// Token cache bounds.
    pub token_cache_capacity: usize,
    pub token_cache_ttl: Duration,
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable `{0}` is not set")]
    Missing(&'static str),

    #[error("environment variable `{0}` has an invalid value")]
    Invalid(&'static str),
}

impl AppConfig {
    /// Load configuration from the environment, applying defaults for every
    /// optional knob. A `.env` file is honored when present.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is absent or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _env = dotenvy::dotenv();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            vault_addr: required("VAULT_ADDR")?,
            vault_token: required("VAULT_TOKEN")?,
            vault_mount: optional("VAULT_MOUNT").unwrap_or_else(|| "secret".to_string()),
            vault_timeout: Duration::from_secs(parsed("VAULT_TIMEOUT_SECS", 10)?),
            credential_prefix: optional("CREDENTIAL_PREFIX")
                .unwrap_or_else(|| "custos-".to_string()),
            credential_id_length: parsed("CREDENTIAL_ID_LENGTH", 20)?,
            credential_secret_length: parsed("CREDENTIAL_SECRET_LENGTH", 40)?,
            master_owner_id: optional("MASTER_OWNER_ID").unwrap_or_else(|| "master".to_string()),
            signing_key_path: optional("SIGNING_KEY_PATH")
                .unwrap_or_else(|| "master/SIGNING_KEY".to_string()),
            rsa_key_size: parsed("RSA_KEY_SIZE", 2048)?,
            private_key_file: optional("PRIVATE_KEY_FILE").map(PathBuf::from),
            public_key_file: optional("PUBLIC_KEY_FILE").map(PathBuf::from),
            issuer_base: required("ISSUER_BASE")?,
            token_cache_capacity: parsed("TOKEN_CACHE_CAPACITY", 1024)?,
            token_cache_ttl: Duration::from_secs(parsed("TOKEN_CACHE_TTL_SECS", 3600)?),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid(name)),
        None => Ok(default),
    }
}
