use std::sync::Arc;

use time::OffsetDateTime;

use crate::config::AuthConfig;
use crate::error::Error;
use crate::store::IdentityStore;
use crate::token::{TokenError, TokenSigner, VerifiedClaims};
use crate::types::{AuthFailure, AuthResult, LoginRequest, Principal, PrincipalId, RefreshRequest};

/// Credential login, token refresh and role checks against an [`IdentityStore`].
///
/// Holds no mutable state: share it behind an `Arc` and call it concurrently.
/// Failed authentication is an ordinary [`AuthResult::Failure`]; `Err` is
/// reserved for invalid input and store faults.
pub struct Authorizer<S> {
    store: S,
    signer: Arc<TokenSigner>,
}

impl<S: IdentityStore> Authorizer<S> {
    #[must_use]
    pub fn new(store: S, config: &AuthConfig) -> Self {
        Self {
            store,
            signer: Arc::new(TokenSigner::new(config)),
        }
    }

    /// Replace the wall clock used for minting and expiry checks.
    ///
    /// The clock lives in the shared [`TokenSigner`], so bearer tokens checked
    /// through [`signer()`](Self::signer) see the same time.
    #[must_use]
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> OffsetDateTime + Send + Sync + 'static,
    ) -> Self {
        self.signer = Arc::new(self.signer.as_ref().clone().with_clock(clock));
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Shared signer, for verifying bearer tokens outside the authorizer.
    #[must_use]
    pub fn signer(&self) -> &Arc<TokenSigner> {
        &self.signer
    }

    /// Authenticate a credential pair and issue a token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if username or password is blank, or
    /// [`Error::Store`] if the credential lookup fails.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResult, Error> {
        require_non_blank(&request.username, "Username cannot be empty")?;
        require_non_blank(&request.password, "Password cannot be empty")?;

        let principal = self
            .store
            .find_by_credentials(&request.username, &request.password)
            .await
            .map_err(Error::Store)?;

        let Some(principal) = principal else {
            tracing::info!("Login rejected: invalid credentials");
            return Ok(AuthResult::Failure(AuthFailure::InvalidCredentials));
        };

        Ok(self.issue(&principal, None))
    }

    /// Validate a previously issued token and mint its replacement.
    ///
    /// The presented token stays valid until its own expiration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the token is blank, or
    /// [`Error::Store`] if the principal lookup fails.
    pub async fn refresh(&self, request: &RefreshRequest) -> Result<AuthResult, Error> {
        require_non_blank(&request.token, "Token cannot be empty")?;

        let claims = match self.verify(request.token.trim()) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(reason = %e, "Refresh rejected: token failed verification");
                return Ok(AuthResult::Failure(AuthFailure::InvalidToken));
            }
        };

        let principal = self
            .store
            .find_by_id(claims.principal_id)
            .await
            .map_err(Error::Store)?;

        let Some(principal) = principal else {
            tracing::info!(
                principal_id = %claims.principal_id,
                "Refresh rejected: principal no longer exists"
            );
            return Ok(AuthResult::Failure(AuthFailure::UserNotFound));
        };

        Ok(self.issue(&principal, Some(claims.expires_at)))
    }

    /// Whether `principal_id` currently holds `required_role` (case-insensitive).
    ///
    /// An unknown principal or a dangling role reference is a plain `false`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for a non-positive id or a blank role
    /// name, or [`Error::Store`] if a lookup fails.
    pub async fn has_access(
        &self,
        principal_id: PrincipalId,
        required_role: &str,
    ) -> Result<bool, Error> {
        if !principal_id.is_valid() {
            return Err(Error::invalid_request(format!(
                "Invalid user ID: {principal_id}"
            )));
        }
        require_non_blank(required_role, "Role cannot be empty")?;

        let Some(principal) = self
            .store
            .find_by_id(principal_id)
            .await
            .map_err(Error::Store)?
        else {
            return Ok(false);
        };

        let Some(role) = self
            .store
            .find_role_by_id(principal.role_id)
            .await
            .map_err(Error::Store)?
        else {
            tracing::warn!(
                principal_id = %principal_id,
                role_id = %principal.role_id,
                "Principal references a missing role"
            );
            return Ok(false);
        };

        Ok(role.matches(required_role))
    }

    /// Verify a token's signature and expiration without touching the store.
    ///
    /// # Errors
    ///
    /// Returns the [`TokenError`] describing why the token was rejected.
    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, TokenError> {
        self.signer.verify(token, self.signer.now())
    }

    // A renewal must expire strictly after the token it replaces.
    fn issue(&self, principal: &Principal, previous_exp: Option<i64>) -> AuthResult {
        let now = self.signer.now();
        let minted = match previous_exp {
            Some(exp) => self.signer.renew(principal, now, exp),
            None => self.signer.mint(principal, now),
        };
        match minted {
            Ok(token) => {
                tracing::info!(principal_id = %principal.id, "Token issued");
                AuthResult::Success {
                    token,
                    principal_id: principal.id,
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    principal_id = %principal.id,
                    "Token generation failed"
                );
                AuthResult::Failure(AuthFailure::TokenGeneration)
            }
        }
    }
}

fn require_non_blank(value: &str, msg: &'static str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::invalid_request(msg));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

    use time::{Date, Time};

    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryIdentityStore;
    use crate::types::{Role, RoleId};

    const SECRET: &str = "ThisIsAVeryLongSecretKeyForSecurityPurposes123!@#";
    const T0: i64 = 1_700_000_000;

    /// Wraps the memory store, counting lookups and optionally failing them.
    #[derive(Default)]
    struct ProbeStore {
        inner: MemoryIdentityStore,
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl ProbeStore {
        fn touch(&self) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err("connection reset".into());
            }
            Ok(())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl IdentityStore for ProbeStore {
        async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>, StoreError> {
            self.touch()?;
            self.inner.find_by_id(id).await
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
            self.touch()?;
            self.inner.find_by_email(email).await
        }

        async fn find_by_credentials(
            &self,
            identifier: &str,
            secret: &str,
        ) -> Result<Option<Principal>, StoreError> {
            self.touch()?;
            self.inner.find_by_credentials(identifier, secret).await
        }

        async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
            self.touch()?;
            self.inner.find_role_by_id(id).await
        }
    }

    fn at(unix: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(unix).unwrap()
    }

    /// Authorizer over a seeded store with a settable clock.
    fn fixture() -> (Authorizer<ProbeStore>, Arc<AtomicI64>) {
        let store = ProbeStore::default();
        store.inner.insert_role(Role::new(1, "Admin"));
        store.inner.insert_role(Role::new(2, "User"));
        store
            .inner
            .insert_principal(1, "admin", "test@example.com", "password123", 1);
        store
            .inner
            .insert_principal(2, "orphan", "orphan@example.com", "password123", 9);

        let now = Arc::new(AtomicI64::new(T0));
        let clock = now.clone();
        let authorizer = Authorizer::new(store, &AuthConfig::new(SECRET).unwrap())
            .with_clock(move || at(clock.load(Ordering::SeqCst)));
        (authorizer, now)
    }

    // ── has_access ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_has_access_matching_role() {
        let (auth, _) = fixture();
        assert!(auth.has_access(PrincipalId(1), "Admin").await.unwrap());
        assert!(auth.has_access(PrincipalId(1), "admin").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_access_other_role() {
        let (auth, _) = fixture();
        assert!(!auth.has_access(PrincipalId(1), "User").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_access_unknown_principal() {
        let (auth, _) = fixture();
        assert!(!auth.has_access(PrincipalId(999), "Admin").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_access_missing_role() {
        let (auth, _) = fixture();
        assert!(!auth.has_access(PrincipalId(2), "Admin").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_access_after_role_removed() {
        let (auth, _) = fixture();
        assert!(auth.has_access(PrincipalId(1), "Admin").await.unwrap());

        assert!(auth.store().inner.remove_role(RoleId(1)));
        assert!(!auth.has_access(PrincipalId(1), "Admin").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_access_rejects_non_positive_id_before_lookup() {
        let (auth, _) = fixture();
        for id in [0, -1, i32::MIN] {
            let err = auth.has_access(PrincipalId(id), "Admin").await.unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)));
        }
        assert_eq!(auth.store().calls(), 0);
    }

    #[tokio::test]
    async fn test_has_access_rejects_blank_role() {
        let (auth, _) = fixture();
        for role in ["", " ", "\t\n"] {
            let err = auth.has_access(PrincipalId(1), role).await.unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)));
        }
        assert_eq!(auth.store().calls(), 0);
    }

    #[tokio::test]
    async fn test_has_access_is_idempotent() {
        let (auth, _) = fixture();
        let first = auth.has_access(PrincipalId(1), "Admin").await.unwrap();
        let second = auth.has_access(PrincipalId(1), "Admin").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_has_access_propagates_store_fault() {
        let (auth, _) = fixture();
        auth.store().fail.store(true, Ordering::SeqCst);
        let err = auth.has_access(PrincipalId(1), "Admin").await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }

    // ── login ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_login_valid_credentials() {
        let (auth, _) = fixture();
        let result = auth
            .login(&LoginRequest::new("test@example.com", "password123"))
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(!result.token().unwrap().is_empty());
        assert_eq!(result.principal_id(), Some(PrincipalId(1)));
        assert_eq!(result.failure(), None);
    }

    #[tokio::test]
    async fn test_login_invalid_credentials() {
        let (auth, _) = fixture();
        let result = auth
            .login(&LoginRequest::new("invalid@example.com", "wrongpassword"))
            .await
            .unwrap();

        assert_eq!(result, AuthResult::Failure(AuthFailure::InvalidCredentials));
        assert_eq!(result.token(), None);
    }

    #[tokio::test]
    async fn test_login_rejects_blank_fields_before_lookup() {
        let (auth, _) = fixture();
        let cases = [
            ("", "password"),
            (" ", "password"),
            ("user", ""),
            ("user", " "),
        ];
        for (username, password) in cases {
            let err = auth
                .login(&LoginRequest::new(username, password))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)), "{username:?}/{password:?}");
        }
        assert_eq!(auth.store().calls(), 0);
    }

    #[tokio::test]
    async fn test_login_token_generation_failure() {
        let store = ProbeStore::default();
        store
            .inner
            .insert_principal(1, "admin", "test@example.com", "password123", 1);
        let auth = Authorizer::new(store, &AuthConfig::new(SECRET).unwrap())
            .with_clock(|| OffsetDateTime::new_utc(Date::MAX, Time::MIDNIGHT));

        let result = auth
            .login(&LoginRequest::new("test@example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(result, AuthResult::Failure(AuthFailure::TokenGeneration));
    }

    #[tokio::test]
    async fn test_login_propagates_store_fault() {
        let (auth, _) = fixture();
        auth.store().fail.store(true, Ordering::SeqCst);
        let err = auth
            .login(&LoginRequest::new("test@example.com", "password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }

    // ── refresh ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_refresh_round_trip() {
        let (auth, now) = fixture();
        let login = auth
            .login(&LoginRequest::new("test@example.com", "password123"))
            .await
            .unwrap();
        let old_token = login.token().unwrap().to_string();
        let old_exp = auth.verify(&old_token).unwrap().expires_at;

        now.store(T0 + 60, Ordering::SeqCst);
        let refreshed = auth.refresh(&RefreshRequest::new(&old_token)).await.unwrap();

        let new_token = refreshed.token().unwrap();
        assert_ne!(new_token, old_token);
        assert_eq!(refreshed.principal_id(), Some(PrincipalId(1)));
        assert!(auth.verify(new_token).unwrap().expires_at > old_exp);

        // No revocation: the old token remains valid until it expires.
        assert!(auth.verify(&old_token).is_ok());
    }

    #[tokio::test]
    async fn test_refresh_in_same_second_issues_new_token() {
        let (auth, _) = fixture();
        let old_token = auth
            .login(&LoginRequest::new("test@example.com", "password123"))
            .await
            .unwrap()
            .token()
            .unwrap()
            .to_string();
        let old_exp = auth.verify(&old_token).unwrap().expires_at;

        let refreshed = auth.refresh(&RefreshRequest::new(&old_token)).await.unwrap();
        let new_token = refreshed.token().unwrap();

        assert_ne!(new_token, old_token);
        assert!(auth.verify(new_token).unwrap().expires_at > old_exp);
    }

    #[tokio::test]
    async fn test_clock_is_shared_with_signer() {
        let (auth, now) = fixture();
        assert_eq!(auth.signer().now(), at(T0));
        now.store(T0 + 5, Ordering::SeqCst);
        assert_eq!(auth.signer().now(), at(T0 + 5));
    }

    #[tokio::test]
    async fn test_refresh_garbage_token() {
        let (auth, _) = fixture();
        let result = auth.refresh(&RefreshRequest::new("not-a-token")).await.unwrap();
        assert_eq!(result, AuthResult::Failure(AuthFailure::InvalidToken));
        assert_eq!(auth.store().calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_expired_token() {
        let (auth, now) = fixture();
        let token = auth
            .login(&LoginRequest::new("test@example.com", "password123"))
            .await
            .unwrap()
            .token()
            .unwrap()
            .to_string();

        now.store(T0 + 7 * 86_400, Ordering::SeqCst);
        let result = auth.refresh(&RefreshRequest::new(token)).await.unwrap();
        assert_eq!(result, AuthResult::Failure(AuthFailure::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_foreign_signature() {
        let (auth, _) = fixture();
        let foreign = TokenSigner::new(
            &AuthConfig::new("AnotherSecretThatIsAlsoLongEnough!!!!").unwrap(),
        )
        .mint(&Principal::new(1, "admin", "test@example.com", "", 1), at(T0))
        .unwrap();

        let result = auth.refresh(&RefreshRequest::new(foreign)).await.unwrap();
        assert_eq!(result, AuthResult::Failure(AuthFailure::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_principal_removed() {
        let (auth, _) = fixture();
        let token = auth
            .login(&LoginRequest::new("test@example.com", "password123"))
            .await
            .unwrap()
            .token()
            .unwrap()
            .to_string();

        auth.store().inner.remove_principal(PrincipalId(1));
        let result = auth.refresh(&RefreshRequest::new(token)).await.unwrap();
        assert_eq!(result, AuthResult::Failure(AuthFailure::UserNotFound));
    }

    #[tokio::test]
    async fn test_refresh_rejects_blank_token() {
        let (auth, _) = fixture();
        for token in ["", " "] {
            let err = auth.refresh(&RefreshRequest::new(token)).await.unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)));
        }
    }
}
