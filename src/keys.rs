//! Signing key management for re-issued tokens.
//!
//! A `KeyManager` either loads fixed key material at construction or lazily
//! generates a 2048-bit RSA keypair on first use and persists it through the
//! secret backend so process restarts reuse the same key. Lazy
//! initialization is single-flight; concurrent first callers never race to
//! generate distinct keys.

use std::{fmt, path::Path, sync::Arc};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL};
use jsonwebtoken::EncodingKey;
use rand::rngs::OsRng;
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding},
};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::OnceCell;
use zeroize::Zeroizing;

use crate::vault::{SecretBackend, SecretData, VaultError};

const PRIVATE_KEY_FIELD: &str = "private_key_pem";
const PUBLIC_KEY_FIELD: &str = "public_key_pem";

/// A loaded signing key with its stable identifier.
pub struct KeyMaterial {
    /// URL-safe unpadded base64 of the SHA-256 digest of the public key DER.
    /// Deterministic for a given keypair.
    pub key_id: String,

    /// RS256 signing key for `jsonwebtoken`.
    pub encoding_key: EncodingKey,

    /// PEM-encoded public key, exposed for verifiers.
    pub public_key_pem: String,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl KeyMaterial {
    /// Build key material from PEM-encoded RSA keys.
    ///
    /// # Errors
    ///
    /// Returns an error when either PEM cannot be parsed.
    pub fn from_pem(private_pem: &str, public_pem: &str) -> Result<Self, KeyManagerError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())?;

        let public_key = RsaPublicKey::from_public_key_pem(public_pem)?;
        let public_der = public_key.to_public_key_der()?;

        Ok(Self {
            key_id: BASE64_URL.encode(Sha256::digest(public_der.as_bytes())),
            encoding_key,
            public_key_pem: public_pem.to_string(),
        })
    }
}

/// Errors raised while loading or generating signing keys.
#[derive(Debug, Error)]
pub enum KeyManagerError {
    #[error("secret backend error")]
    Backend(#[from] VaultError),

    #[error("RSA key generation failed")]
    Rsa(#[from] rsa::Error),

    #[error("private key encoding failed")]
    Pkcs8(#[from] rsa::pkcs8::Error),

    #[error("public key encoding failed")]
    Spki(#[from] rsa::pkcs8::spki::Error),

    #[error("signing key rejected by jwt library")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("failed to read key material file")]
    Io(#[from] std::io::Error),

    #[error("stored key material at `{0}` is incomplete")]
    Corrupt(String),

    #[error("key manager has no backend and no preloaded material")]
    MissingBackend,
}

/// Provides a stable RSA keypair and key identifier for token signing.
pub struct KeyManager {
    backend: Option<Arc<dyn SecretBackend>>,
    key_path: String,
    key_size: usize,
    material: OnceCell<KeyMaterial>,
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("key_path", &self.key_path)
            .field("key_size", &self.key_size)
            .field("initialized", &self.material.initialized())
            .finish_non_exhaustive()
    }
}

impl KeyManager {
    /// Lazy strategy: load from the backend at `key_path`, generating and
    /// persisting a fresh keypair when nothing is stored yet.
    #[must_use]
    pub fn new(backend: Arc<dyn SecretBackend>, key_path: impl Into<String>, key_size: usize) -> Self {
        Self {
            backend: Some(backend),
            key_path: key_path.into(),
            key_size,
            material: OnceCell::new(),
        }
    }

    /// Static strategy: fixed key material supplied at construction.
    ///
    /// # Errors
    ///
    /// Returns an error when the PEMs cannot be parsed.
    pub fn from_static_pem(private_pem: &str, public_pem: &str) -> Result<Self, KeyManagerError> {
        let material = KeyMaterial::from_pem(private_pem, public_pem)?;

        Ok(Self {
            backend: None,
            key_path: String::new(),
            key_size: 0,
            material: OnceCell::new_with(Some(material)),
        })
    }

    /// Static strategy, reading the PEMs from configured file locations.
    ///
    /// # Errors
    ///
    /// Returns an error when a file cannot be read or parsed.
    pub fn from_pem_files(
        private_path: &Path,
        public_path: &Path,
    ) -> Result<Self, KeyManagerError> {
        let private_pem = Zeroizing::new(std::fs::read_to_string(private_path)?);
        let public_pem = std::fs::read_to_string(public_path)?;

        Self::from_static_pem(&private_pem, &public_pem)
    }

    /// The signing key, initializing it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error when loading or generating the keypair fails.
    pub async fn signing_key(&self) -> Result<&KeyMaterial, KeyManagerError> {
        self.material
            .get_or_try_init(|| self.load_or_generate())
            .await
    }

    /// The stable key identifier.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::signing_key`].
    pub async fn key_id(&self) -> Result<&str, KeyManagerError> {
        Ok(self.signing_key().await?.key_id.as_str())
    }

    async fn load_or_generate(&self) -> Result<KeyMaterial, KeyManagerError> {
        let backend = self.backend.as_ref().ok_or(KeyManagerError::MissingBackend)?;

        if let Some(data) = backend.read(&self.key_path).await? {
            let private_pem = Zeroizing::new(
                field(&data, PRIVATE_KEY_FIELD)
                    .ok_or_else(|| KeyManagerError::Corrupt(self.key_path.clone()))?,
            );
            let public_pem = field(&data, PUBLIC_KEY_FIELD)
                .ok_or_else(|| KeyManagerError::Corrupt(self.key_path.clone()))?;

            return KeyMaterial::from_pem(&private_pem, &public_pem);
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, self.key_size)?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_pem = private_key.to_pkcs8_pem(LineEnding::LF)?;
        let public_pem = public_key.to_public_key_pem(LineEnding::LF)?;

        let mut data = SecretData::new();
        data.insert(
            PRIVATE_KEY_FIELD.to_string(),
            Value::String(private_pem.to_string()),
        );
        data.insert(
            PUBLIC_KEY_FIELD.to_string(),
            Value::String(public_pem.clone()),
        );

        backend.write(&self.key_path, &data).await?;

        KeyMaterial::from_pem(&private_pem, &public_pem)
    }
}

fn field(data: &SecretData, name: &str) -> Option<String> {
    data.get(name).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::OnceLock;

    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::vault::MockSecretBackend;

    use super::*;

    /// One shared test keypair; RSA generation is too slow to repeat per test.
    pub(crate) fn test_pems() -> &'static (String, String) {
        static PEMS: OnceLock<(String, String)> = OnceLock::new();

        PEMS.get_or_init(|| {
            let private_key =
                RsaPrivateKey::new(&mut OsRng, 2048).expect("test key generation should succeed");
            let public_key = RsaPublicKey::from(&private_key);

            (
                private_key
                    .to_pkcs8_pem(LineEnding::LF)
                    .expect("pem encode")
                    .to_string(),
                public_key
                    .to_public_key_pem(LineEnding::LF)
                    .expect("pem encode"),
            )
        })
    }

    #[test]
    fn key_id_is_deterministic_for_a_keypair() -> TestResult {
        let (private_pem, public_pem) = test_pems();

        let first = KeyMaterial::from_pem(private_pem, public_pem)?;
        let second = KeyMaterial::from_pem(private_pem, public_pem)?;

        assert_eq!(first.key_id, second.key_id);
        assert!(!first.key_id.is_empty());
        assert!(!first.key_id.contains('='), "key id must be unpadded");

        Ok(())
    }

    #[tokio::test]
    async fn loads_stored_material_without_writing() -> TestResult {
        let (private_pem, public_pem) = test_pems();

        let mut data = SecretData::new();
        data.insert(
            PRIVATE_KEY_FIELD.to_string(),
            Value::String(private_pem.clone()),
        );
        data.insert(
            PUBLIC_KEY_FIELD.to_string(),
            Value::String(public_pem.clone()),
        );

        let mut backend = MockSecretBackend::new();
        backend
            .expect_read()
            .with(eq("master/SIGNING_KEY"))
            .times(1)
            .returning(move |_| Ok(Some(data.clone())));
        backend.expect_write().times(0);

        let manager = KeyManager::new(Arc::new(backend), "master/SIGNING_KEY", 2048);

        let expected = KeyMaterial::from_pem(private_pem, public_pem)?;
        assert_eq!(manager.key_id().await?, expected.key_id);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_first_use_generates_exactly_once() -> TestResult {
        let mut backend = MockSecretBackend::new();

        backend.expect_read().times(1).returning(|_| Ok(None));
        backend.expect_write().times(1).returning(|_, _| Ok(()));

        let manager = Arc::new(KeyManager::new(Arc::new(backend), "master/SIGNING_KEY", 2048));

        let (first, second) = tokio::join!(manager.key_id(), manager.key_id());

        assert_eq!(first?, second?);

        Ok(())
    }

    #[tokio::test]
    async fn incomplete_stored_material_is_corrupt() {
        let mut data = SecretData::new();
        data.insert(
            PRIVATE_KEY_FIELD.to_string(),
            Value::String("not even a pem".to_string()),
        );

        let mut backend = MockSecretBackend::new();
        backend.expect_read().returning(move |_| Ok(Some(data.clone())));

        let manager = KeyManager::new(Arc::new(backend), "master/SIGNING_KEY", 2048);

        assert!(matches!(
            manager.signing_key().await,
            Err(KeyManagerError::Corrupt(_))
        ));
    }

    #[test]
    fn static_strategy_serves_preloaded_material() -> TestResult {
        let (private_pem, public_pem) = test_pems();
        let manager = KeyManager::from_static_pem(private_pem, public_pem)?;

        let material = manager.material.get().ok_or("material should be preset")?;
        assert!(!material.key_id.is_empty());

        Ok(())
    }
}
