use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::types::{Principal, PrincipalId, Role, RoleId};

/// Consumer-provided user and role lookups.
///
/// Absence is `Ok(None)`. Errors are reserved for I/O or backend failures and are
/// propagated to the caller unchanged.
///
/// # Example
///
/// ```rust,ignore
/// impl IdentityStore for PgIdentityStore {
///     async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>, StoreError> {
///         let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
///             .bind(id.0)
///             .fetch_optional(&self.pool)
///             .await?;
///         Ok(row.map(Into::into))
///     }
///     // ...
/// }
/// ```
pub trait IdentityStore: Send + Sync + 'static {
    /// Look up a principal by id.
    fn find_by_id(
        &self,
        id: PrincipalId,
    ) -> impl Future<Output = Result<Option<Principal>, StoreError>> + Send;

    /// Look up a principal by email address.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Principal>, StoreError>> + Send;

    /// Match an (identifier, secret) pair. The store alone knows how secrets are
    /// hashed and compared.
    fn find_by_credentials(
        &self,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<Option<Principal>, StoreError>> + Send;

    /// Look up a role by id.
    fn find_role_by_id(
        &self,
        id: RoleId,
    ) -> impl Future<Output = Result<Option<Role>, StoreError>> + Send;
}

/// Hex-encoded SHA-256 digest, the secret format used by [`MemoryIdentityStore`].
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

#[derive(Default)]
struct Tables {
    principals: HashMap<PrincipalId, Principal>,
    roles: HashMap<RoleId, Role>,
}

/// In-process identity store for tests and local development.
///
/// Secrets are stored as [`hash_secret`] digests. The credential identifier
/// matches either the email (case-insensitive) or the display name.
#[derive(Default)]
pub struct MemoryIdentityStore {
    tables: RwLock<Tables>,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a principal, hashing its plaintext secret.
    pub fn insert_principal(
        &self,
        id: impl Into<PrincipalId>,
        name: &str,
        email: &str,
        secret: &str,
        role_id: impl Into<RoleId>,
    ) -> Principal {
        let principal = Principal::new(id, name, email, hash_secret(secret), role_id);
        self.write()
            .principals
            .insert(principal.id, principal.clone());
        principal
    }

    /// Insert or replace a role.
    pub fn insert_role(&self, role: Role) {
        self.write().roles.insert(role.id, role);
    }

    /// Remove a principal. Returns whether it existed.
    pub fn remove_principal(&self, id: PrincipalId) -> bool {
        self.write().principals.remove(&id).is_some()
    }

    /// Remove a role. Returns whether it existed.
    pub fn remove_role(&self, id: RoleId) -> bool {
        self.write().roles.remove(&id).is_some()
    }

    // A poisoned lock only means another thread panicked mid-insert; the maps
    // themselves are still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lookup_email(&self, email: &str) -> Option<Principal> {
        self.read()
            .principals
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned()
    }
}

impl IdentityStore for MemoryIdentityStore {
    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>, StoreError> {
        Ok(self.read().principals.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self.lookup_email(email))
    }

    async fn find_by_credentials(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Option<Principal>, StoreError> {
        let digest = hash_secret(secret);
        let candidate = self.lookup_email(identifier).or_else(|| {
            self.read()
                .principals
                .values()
                .find(|p| p.name == identifier)
                .cloned()
        });
        Ok(candidate.filter(|p| p.secret_hash == digest))
    }

    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        Ok(self.read().roles.get(&id).cloned())
    }
}
