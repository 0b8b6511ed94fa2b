//! Token authorizer: the request-level decision procedure.

use std::{fmt, sync::Arc};

use tracing::debug;

use crate::{
    authz::{
        claim::AuthClaim,
        errors::{AuthFailure, AuthorizerError},
        mode::{AuthMode, select_mode},
    },
    credentials::CredentialStore,
    identity::{IdentityService, UserClaims},
    tenants::{Tenant, TenantProfileService},
};

/// An inbound request as seen by the authorizer.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// The `Authorization` header value, scheme prefix included.
    pub authorization: Option<String>,

    /// The non-standard on-behalf-of user token header, when present.
    pub user_token: Option<String>,

    /// Child tenant credential id from the query or path, when present.
    pub client_id: Option<String>,
}

impl AuthRequest {
    /// The primary credential with any `Basic`/`Bearer` scheme stripped.
    #[must_use]
    pub fn primary_token(&self) -> Option<&str> {
        let value = self.authorization.as_deref()?.trim();

        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .or_else(|| value.strip_prefix("Basic "))
            .or_else(|| value.strip_prefix("basic "))
            .unwrap_or(value)
            .trim();

        (!token.is_empty()).then_some(token)
    }
}

/// Whether a token is shaped like a JWT rather than an opaque credential.
#[must_use]
pub fn is_jwt(token: &str) -> bool {
    token.bytes().filter(|byte| *byte == b'.').count() == 2
}

/// Tenant hierarchy rule shared by the delegated modes.
///
/// True iff the child is the parent tenant itself or a direct child of it.
/// Transitive ancestry does not authorize.
#[must_use]
pub fn is_related(parent_id: &str, child: &Tenant) -> bool {
    child.tenant_id == parent_id || child.parent_tenant_id.as_deref() == Some(parent_id)
}

/// Decides which authorization mode applies to a request, validates tenant
/// hierarchy and status, and resolves the authorization claim.
pub struct TokenAuthorizer {
    store: Arc<dyn CredentialStore>,
    tenants: Arc<dyn TenantProfileService>,
    identity: Arc<dyn IdentityService>,
}

impl fmt::Debug for TokenAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthorizer").finish_non_exhaustive()
    }
}

impl TokenAuthorizer {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tenants: Arc<dyn TenantProfileService>,
        identity: Arc<dyn IdentityService>,
    ) -> Self {
        Self {
            store,
            tenants,
            identity,
        }
    }

    /// Authorize a request, returning its resolved claim.
    ///
    /// # Errors
    ///
    /// Every decode, lookup, hierarchy, or verification failure collapses to
    /// [`AuthorizerError::Unauthorized`]; backend inconsistencies surface as
    /// [`AuthorizerError::Internal`].
    pub async fn authorize(&self, request: &AuthRequest) -> Result<AuthClaim, AuthorizerError> {
        let Some(token) = request.primary_token() else {
            debug!("request carries no primary credential");
            return Err(AuthorizerError::Unauthorized);
        };

        let mode = select_mode(
            request.client_id.is_some(),
            request.user_token.is_some(),
            is_jwt(token),
        );

        debug!(?mode, "selected authorization mode");

        let outcome = match mode {
            AuthMode::Basic => self.basic(token).await.map(Some),
            AuthMode::DelegatedBasic => {
                let client_id = required_client_id(request)?;
                self.delegated_basic(token, client_id).await
            }
            AuthMode::DelegatedOnBehalf => {
                let client_id = required_client_id(request)?;
                let user_token = request
                    .user_token
                    .as_deref()
                    .ok_or(AuthorizerError::Unauthorized)?;
                self.delegated_on_behalf(token, client_id, user_token).await
            }
            AuthMode::DelegatedUserToken => {
                let client_id = required_client_id(request)?;
                self.delegated_user_token(token, client_id).await
            }
            AuthMode::UserToken => {
                let user_token = request.user_token.as_deref().unwrap_or(token);
                self.user_token(user_token).await.map(Some)
            }
        };

        match outcome {
            Ok(Some(claim)) => Ok(claim),
            Ok(None) => {
                debug!(?mode, "tenant status or hierarchy check failed");
                Err(AuthorizerError::Unauthorized)
            }
            Err(failure) => Err(failure.normalize()),
        }
    }

    /// Mode 1: resolve the basic-auth caller's own claim.
    async fn basic(&self, token: &str) -> Result<AuthClaim, AuthFailure> {
        let resolved = if is_jwt(token) {
            self.store.all_credentials_from_jwt(token).await?
        } else {
            self.store.all_credentials_from_token(token).await?
        };

        Ok(AuthClaim::from_resolved(&resolved))
    }

    /// Mode 2: basic auth acting on a child tenant.
    async fn delegated_basic(
        &self,
        token: &str,
        client_id: &str,
    ) -> Result<Option<AuthClaim>, AuthFailure> {
        let caller = self.basic(token).await?;
        let child_owner = self
            .store
            .custos_credential_from_client_id(client_id)
            .await?
            .owner_id;

        // The super-tenant bypasses both the status and hierarchy checks.
        if !self
            .child_allowed(&caller, &child_owner, SuperTenantRule::BypassesAll)
            .await?
        {
            return Ok(None);
        }

        let mut claim = self.owner_claim(&child_owner).await?;
        claim.performed_by = caller.performed_by;

        Ok(Some(claim))
    }

    /// Mode 3: the mode-2 hierarchy check, then validate the on-behalf-of
    /// user token and return its claim.
    async fn delegated_on_behalf(
        &self,
        token: &str,
        client_id: &str,
        user_token: &str,
    ) -> Result<Option<AuthClaim>, AuthFailure> {
        let caller = self.basic(token).await?;
        let child_owner = self
            .store
            .custos_credential_from_client_id(client_id)
            .await?
            .owner_id;

        if !self
            .child_allowed(&caller, &child_owner, SuperTenantRule::BypassesAll)
            .await?
        {
            return Ok(None);
        }

        self.user_token(user_token).await.map(Some)
    }

    /// Mode 4: the primary credential is itself a user token; return the
    /// child tenant's full credential set.
    async fn delegated_user_token(
        &self,
        token: &str,
        client_id: &str,
    ) -> Result<Option<AuthClaim>, AuthFailure> {
        let resolved = self.store.all_credentials_from_jwt(token).await?;
        let caller = AuthClaim::from_resolved(&resolved);

        let child_owner = self
            .store
            .custos_credential_from_client_id(client_id)
            .await?
            .owner_id;

        // Status is enforced even for the super-tenant here; only the
        // hierarchy check is bypassed.
        if !self
            .child_allowed(&caller, &child_owner, SuperTenantRule::BypassesHierarchy)
            .await?
        {
            return Ok(None);
        }

        let mut claim = self.owner_claim(&child_owner).await?;
        claim.username = caller.username.clone();
        claim.performed_by = caller.username;

        Ok(Some(claim))
    }

    /// Mode 5: treat the credential as a user token and confirm it is still
    /// valid upstream.
    async fn user_token(&self, token: &str) -> Result<AuthClaim, AuthFailure> {
        let resolved = self.store.all_credentials_from_jwt(token).await?;
        let claim = AuthClaim::from_resolved(&resolved);

        let authenticated = self
            .identity
            .is_authenticated(
                token,
                &UserClaims {
                    username: claim.username.clone(),
                    tenant_id: claim.tenant_id.clone(),
                },
            )
            .await?;

        if !authenticated {
            return Err(AuthFailure::Unauthenticated);
        }

        Ok(claim)
    }

    async fn child_allowed(
        &self,
        caller: &AuthClaim,
        child_tenant_id: &str,
        rule: SuperTenantRule,
    ) -> Result<bool, AuthFailure> {
        let caller_is_super = caller.is_super_tenant();

        if caller_is_super && rule == SuperTenantRule::BypassesAll {
            return Ok(true);
        }

        let Some(child) = self.tenants.get_tenant(child_tenant_id).await? else {
            debug!(child_tenant_id, "child tenant does not exist");
            return Ok(false);
        };

        if !child.status.is_active() {
            debug!(child_tenant_id, "child tenant is not active");
            return Ok(false);
        }

        Ok(caller_is_super || is_related(&caller.tenant_id, &child))
    }

    async fn owner_claim(&self, owner_id: &str) -> Result<AuthClaim, AuthFailure> {
        let credentials = self.store.get_all_credentials(owner_id).await?;

        Ok(AuthClaim::from_metadata(owner_id, &credentials))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SuperTenantRule {
    /// The super-tenant skips the status and hierarchy checks entirely.
    BypassesAll,

    /// The super-tenant still requires an ACTIVE child tenant.
    BypassesHierarchy,
}

fn required_client_id(request: &AuthRequest) -> Result<&str, AuthorizerError> {
    request
        .client_id
        .as_deref()
        .ok_or(AuthorizerError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::{
        credentials::{
            CredentialMetadata, CredentialStoreError, CredentialType, MockCredentialStore,
            ResolvedCredentials,
        },
        identity::MockIdentityService,
        tenants::{MockTenantProfileService, TenantStatus},
    };

    use super::*;

    fn tenant(tenant_id: &str, parent: Option<&str>, status: TenantStatus) -> Tenant {
        Tenant {
            tenant_id: tenant_id.to_string(),
            parent_tenant_id: parent.map(str::to_string),
            status,
        }
    }

    fn custos_metadata(owner_id: &str, super_tenant: bool) -> CredentialMetadata {
        CredentialMetadata {
            owner_id: owner_id.to_string(),
            id: format!("custos-abc-{owner_id}"),
            secret: "cs".to_string(),
            credential_type: CredentialType::Custos,
            client_id_issued_at: Some(Timestamp::UNIX_EPOCH),
            client_secret_expired_at: None,
            super_admin: false,
            super_tenant,
        }
    }

    fn resolved(owner_id: &str, super_tenant: bool) -> ResolvedCredentials {
        ResolvedCredentials {
            owner_id: owner_id.to_string(),
            requester_username: None,
            requester_email: None,
            credentials: vec![custos_metadata(owner_id, super_tenant)],
        }
    }

    fn authorizer(
        store: MockCredentialStore,
        tenants: MockTenantProfileService,
        identity: MockIdentityService,
    ) -> TokenAuthorizer {
        TokenAuthorizer::new(Arc::new(store), Arc::new(tenants), Arc::new(identity))
    }

    fn basic_request(client_id: Option<&str>) -> AuthRequest {
        AuthRequest {
            authorization: Some("Basic b3BhcXVldG9rZW4=".to_string()),
            user_token: None,
            client_id: client_id.map(str::to_string),
        }
    }

    #[test]
    fn is_related_truth_table() {
        let parent = tenant("tenant-p", None, TenantStatus::Active);
        let child = tenant("tenant-c", Some("tenant-p"), TenantStatus::Active);
        let grandchild = tenant("tenant-g", Some("tenant-c"), TenantStatus::Active);

        assert!(is_related("tenant-p", &parent), "same tenant is related");
        assert!(is_related("tenant-p", &child), "direct child is related");
        assert!(
            !is_related("tenant-p", &grandchild),
            "transitive ancestry must not authorize"
        );
    }

    #[test]
    fn primary_token_strips_schemes() {
        let bearer = AuthRequest {
            authorization: Some("Bearer aaa.bbb.ccc".to_string()),
            ..AuthRequest::default()
        };
        let basic = AuthRequest {
            authorization: Some("Basic b3BhcXVl".to_string()),
            ..AuthRequest::default()
        };
        let empty = AuthRequest {
            authorization: Some("Bearer ".to_string()),
            ..AuthRequest::default()
        };

        assert_eq!(bearer.primary_token(), Some("aaa.bbb.ccc"));
        assert_eq!(basic.primary_token(), Some("b3BhcXVl"));
        assert_eq!(empty.primary_token(), None);
        assert!(is_jwt("aaa.bbb.ccc"));
        assert!(!is_jwt("b3BhcXVl"));
    }

    #[tokio::test]
    async fn basic_auth_resolves_own_claim() -> TestResult {
        let mut store = MockCredentialStore::new();
        store
            .expect_all_credentials_from_token()
            .returning(|_| Ok(resolved("tenant-a", false)));

        let authorizer = authorizer(
            store,
            MockTenantProfileService::new(),
            MockIdentityService::new(),
        );

        let claim = authorizer.authorize(&basic_request(None)).await?;

        assert_eq!(claim.tenant_id, "tenant-a");
        assert!(claim.custos.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn super_tenant_bypass_returns_child_claim() -> TestResult {
        let mut store = MockCredentialStore::new();
        store
            .expect_all_credentials_from_token()
            .returning(|_| Ok(resolved("tenant-a", true)));
        store
            .expect_custos_credential_from_client_id()
            .returning(|client_id| {
                assert_eq!(client_id, "custos-abc-tenant-b");
                Ok(custos_metadata("tenant-b", false))
            });
        store
            .expect_get_all_credentials()
            .returning(|owner_id| Ok(vec![custos_metadata(owner_id, false)]));

        // The super-tenant path must not consult the tenant profile at all.
        let mut tenants = MockTenantProfileService::new();
        tenants.expect_get_tenant().times(0);

        let authorizer = authorizer(store, tenants, MockIdentityService::new());

        let claim = authorizer
            .authorize(&basic_request(Some("custos-abc-tenant-b")))
            .await?;

        assert_eq!(claim.tenant_id, "tenant-b");

        Ok(())
    }

    #[tokio::test]
    async fn direct_child_active_is_authorized() -> TestResult {
        let mut store = MockCredentialStore::new();
        store
            .expect_all_credentials_from_token()
            .returning(|_| Ok(resolved("tenant-a", false)));
        store
            .expect_custos_credential_from_client_id()
            .returning(|_| Ok(custos_metadata("tenant-b", false)));
        store
            .expect_get_all_credentials()
            .returning(|owner_id| Ok(vec![custos_metadata(owner_id, false)]));

        let mut tenants = MockTenantProfileService::new();
        tenants.expect_get_tenant().returning(|_| {
            Ok(Some(tenant(
                "tenant-b",
                Some("tenant-a"),
                TenantStatus::Active,
            )))
        });

        let authorizer = authorizer(store, tenants, MockIdentityService::new());

        let claim = authorizer
            .authorize(&basic_request(Some("custos-abc-tenant-b")))
            .await?;

        assert_eq!(claim.tenant_id, "tenant-b");

        Ok(())
    }

    #[tokio::test]
    async fn unrelated_tenant_is_unauthorized() {
        let mut store = MockCredentialStore::new();
        store
            .expect_all_credentials_from_token()
            .returning(|_| Ok(resolved("tenant-a", false)));
        store
            .expect_custos_credential_from_client_id()
            .returning(|_| Ok(custos_metadata("tenant-c", false)));

        let mut tenants = MockTenantProfileService::new();
        tenants.expect_get_tenant().returning(|_| {
            Ok(Some(tenant(
                "tenant-c",
                Some("tenant-x"),
                TenantStatus::Active,
            )))
        });

        let authorizer = authorizer(store, tenants, MockIdentityService::new());

        let result = authorizer
            .authorize(&basic_request(Some("custos-abc-tenant-c")))
            .await;

        assert!(matches!(result, Err(AuthorizerError::Unauthorized)));
    }

    #[tokio::test]
    async fn inactive_child_is_unauthorized() {
        let mut store = MockCredentialStore::new();
        store
            .expect_all_credentials_from_token()
            .returning(|_| Ok(resolved("tenant-a", false)));
        store
            .expect_custos_credential_from_client_id()
            .returning(|_| Ok(custos_metadata("tenant-b", false)));

        let mut tenants = MockTenantProfileService::new();
        tenants.expect_get_tenant().returning(|_| {
            Ok(Some(tenant(
                "tenant-b",
                Some("tenant-a"),
                TenantStatus::Deactivated,
            )))
        });

        let authorizer = authorizer(store, tenants, MockIdentityService::new());

        let result = authorizer
            .authorize(&basic_request(Some("custos-abc-tenant-b")))
            .await;

        assert!(matches!(result, Err(AuthorizerError::Unauthorized)));
    }

    #[tokio::test]
    async fn on_behalf_rejected_user_token_is_unauthorized() {
        let mut store = MockCredentialStore::new();
        store
            .expect_all_credentials_from_token()
            .returning(|_| Ok(resolved("tenant-a", false)));
        store
            .expect_custos_credential_from_client_id()
            .returning(|_| Ok(custos_metadata("tenant-b", false)));
        store.expect_all_credentials_from_jwt().returning(|token| {
            assert_eq!(token, "uuu.vvv.www");
            Ok(ResolvedCredentials {
                requester_username: Some("obo-user".to_string()),
                ..resolved("tenant-u", false)
            })
        });

        let mut tenants = MockTenantProfileService::new();
        tenants.expect_get_tenant().returning(|_| {
            Ok(Some(tenant(
                "tenant-b",
                Some("tenant-a"),
                TenantStatus::Active,
            )))
        });

        // The hierarchy check passes; rejection must come from the
        // upstream validation of the on-behalf token itself.
        let mut identity = MockIdentityService::new();
        identity
            .expect_is_authenticated()
            .times(1)
            .returning(|_, _| Ok(false));

        let authorizer = authorizer(store, tenants, identity);

        let request = AuthRequest {
            user_token: Some("uuu.vvv.www".to_string()),
            ..basic_request(Some("custos-abc-tenant-b"))
        };

        let result = authorizer.authorize(&request).await;

        assert!(matches!(result, Err(AuthorizerError::Unauthorized)));
    }

    #[tokio::test]
    async fn on_behalf_valid_user_token_returns_its_claim() -> TestResult {
        let mut store = MockCredentialStore::new();
        store
            .expect_all_credentials_from_token()
            .returning(|_| Ok(resolved("tenant-a", false)));
        store
            .expect_custos_credential_from_client_id()
            .returning(|_| Ok(custos_metadata("tenant-b", false)));
        store.expect_all_credentials_from_jwt().returning(|token| {
            assert_eq!(token, "uuu.vvv.www");
            Ok(ResolvedCredentials {
                requester_username: Some("obo-user".to_string()),
                ..resolved("tenant-u", false)
            })
        });

        let mut tenants = MockTenantProfileService::new();
        tenants.expect_get_tenant().returning(|_| {
            Ok(Some(tenant(
                "tenant-b",
                Some("tenant-a"),
                TenantStatus::Active,
            )))
        });

        let mut identity = MockIdentityService::new();
        identity
            .expect_is_authenticated()
            .times(1)
            .returning(|token, claims| {
                assert_eq!(token, "uuu.vvv.www");
                assert_eq!(claims.username, "obo-user");
                Ok(true)
            });

        let authorizer = authorizer(store, tenants, identity);

        let request = AuthRequest {
            user_token: Some("uuu.vvv.www".to_string()),
            ..basic_request(Some("custos-abc-tenant-b"))
        };

        let claim = authorizer.authorize(&request).await?;

        // Mode 3 hands back the on-behalf user's claim, not the child's.
        assert_eq!(claim.tenant_id, "tenant-u");
        assert_eq!(claim.username, "obo-user");

        Ok(())
    }

    #[tokio::test]
    async fn user_token_header_is_validated_over_the_primary() -> TestResult {
        let mut store = MockCredentialStore::new();
        store.expect_all_credentials_from_jwt().returning(|token| {
            assert_eq!(token, "uuu.vvv.www");
            Ok(ResolvedCredentials {
                requester_username: Some("user".to_string()),
                ..resolved("tenant-a", false)
            })
        });

        let mut identity = MockIdentityService::new();
        identity
            .expect_is_authenticated()
            .times(1)
            .returning(|token, _| {
                assert_eq!(token, "uuu.vvv.www");
                Ok(true)
            });

        let authorizer = authorizer(store, MockTenantProfileService::new(), identity);

        let request = AuthRequest {
            authorization: Some("Bearer ppp.qqq.rrr".to_string()),
            user_token: Some("uuu.vvv.www".to_string()),
            client_id: None,
        };

        let claim = authorizer.authorize(&request).await?;

        assert_eq!(claim.tenant_id, "tenant-a");

        Ok(())
    }

    #[tokio::test]
    async fn user_token_requires_upstream_confirmation() {
        let mut store = MockCredentialStore::new();
        store.expect_all_credentials_from_jwt().returning(|_| {
            Ok(ResolvedCredentials {
                requester_username: Some("user".to_string()),
                ..resolved("tenant-a", false)
            })
        });

        let mut identity = MockIdentityService::new();
        identity
            .expect_is_authenticated()
            .returning(|_, claims| {
                assert_eq!(claims.username, "user");
                assert_eq!(claims.tenant_id, "tenant-a");
                Ok(false)
            });

        let authorizer = authorizer(store, MockTenantProfileService::new(), identity);

        let request = AuthRequest {
            authorization: Some("Bearer aaa.bbb.ccc".to_string()),
            ..AuthRequest::default()
        };

        let result = authorizer.authorize(&request).await;

        assert!(matches!(result, Err(AuthorizerError::Unauthorized)));
    }

    #[tokio::test]
    async fn valid_user_token_returns_claim() -> TestResult {
        let mut store = MockCredentialStore::new();
        store.expect_all_credentials_from_jwt().returning(|_| {
            Ok(ResolvedCredentials {
                requester_username: Some("user".to_string()),
                ..resolved("tenant-a", false)
            })
        });

        let mut identity = MockIdentityService::new();
        identity.expect_is_authenticated().returning(|_, _| Ok(true));

        let authorizer = authorizer(store, MockTenantProfileService::new(), identity);

        let request = AuthRequest {
            authorization: Some("Bearer aaa.bbb.ccc".to_string()),
            ..AuthRequest::default()
        };

        let claim = authorizer.authorize(&request).await?;

        assert_eq!(claim.tenant_id, "tenant-a");
        assert_eq!(claim.username, "user");

        Ok(())
    }

    #[tokio::test]
    async fn secret_mismatch_is_unauthorized_but_backend_failure_is_internal() {
        let mut store = MockCredentialStore::new();
        store
            .expect_all_credentials_from_token()
            .times(1)
            .returning(|_| Err(CredentialStoreError::AuthenticationFailure));

        let authorizer_mismatch = authorizer(
            store,
            MockTenantProfileService::new(),
            MockIdentityService::new(),
        );

        assert!(matches!(
            authorizer_mismatch.authorize(&basic_request(None)).await,
            Err(AuthorizerError::Unauthorized)
        ));

        let mut store = MockCredentialStore::new();
        store
            .expect_all_credentials_from_token()
            .times(1)
            .returning(|_| Err(CredentialStoreError::Internal("read-back empty".to_string())));

        let authorizer_internal = authorizer(
            store,
            MockTenantProfileService::new(),
            MockIdentityService::new(),
        );

        assert!(matches!(
            authorizer_internal.authorize(&basic_request(None)).await,
            Err(AuthorizerError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn missing_credential_is_unauthorized() {
        let authorizer = authorizer(
            MockCredentialStore::new(),
            MockTenantProfileService::new(),
            MockIdentityService::new(),
        );

        let result = authorizer.authorize(&AuthRequest::default()).await;

        assert!(matches!(result, Err(AuthorizerError::Unauthorized)));
    }

    #[tokio::test]
    async fn mode_four_returns_child_full_credential_set() -> TestResult {
        let mut store = MockCredentialStore::new();
        store.expect_all_credentials_from_jwt().returning(|_| {
            Ok(ResolvedCredentials {
                requester_username: Some("admin-user".to_string()),
                ..resolved("tenant-a", false)
            })
        });
        store
            .expect_custos_credential_from_client_id()
            .returning(|_| Ok(custos_metadata("tenant-b", false)));
        store.expect_get_all_credentials().returning(|owner_id| {
            let mut iam = custos_metadata(owner_id, false);
            iam.credential_type = CredentialType::Iam;
            iam.id = "iam-id".to_string();

            Ok(vec![custos_metadata(owner_id, false), iam])
        });

        let mut tenants = MockTenantProfileService::new();
        tenants.expect_get_tenant().returning(|_| {
            Ok(Some(tenant(
                "tenant-b",
                Some("tenant-a"),
                TenantStatus::Active,
            )))
        });

        let authorizer = authorizer(store, tenants, MockIdentityService::new());

        let request = AuthRequest {
            authorization: Some("Bearer aaa.bbb.ccc".to_string()),
            user_token: None,
            client_id: Some("custos-abc-tenant-b".to_string()),
        };

        let claim = authorizer.authorize(&request).await?;

        assert_eq!(claim.tenant_id, "tenant-b");
        assert_eq!(claim.performed_by, "admin-user");
        assert!(claim.custos.is_some());
        assert!(claim.iam.is_some());

        Ok(())
    }
}
