use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};

/// Numeric principal (user) identifier, as assigned by the identity store.
///
/// Valid identifiers are positive; [`Authorizer`](crate::Authorizer) rejects
/// anything else before touching the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    FromStr, From, Into,
)]
#[serde(transparent)]
pub struct PrincipalId(pub i32);

impl PrincipalId {
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

/// Numeric role identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct RoleId(pub i32);

/// A user record as loaded from the identity store. Read-only for the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Principal {
    pub id: PrincipalId,
    pub name: String,
    pub email: String,
    /// Stored credential secret, already hashed. Never compared by the core.
    #[serde(skip_serializing, default)]
    pub secret_hash: String,
    pub role_id: RoleId,
}

impl Principal {
    #[must_use]
    pub fn new(
        id: impl Into<PrincipalId>,
        name: impl Into<String>,
        email: impl Into<String>,
        secret_hash: impl Into<String>,
        role_id: impl Into<RoleId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            secret_hash: secret_hash.into(),
            role_id: role_id.into(),
        }
    }
}

/// A named permission group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Role {
    #[must_use]
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Case-insensitive comparison against a required role name.
    #[must_use]
    pub fn matches(&self, required: &str) -> bool {
        self.name.to_lowercase() == required.to_lowercase()
    }
}

/// Username-or-email plus secret.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Manual Debug: keep the password out of logs.
impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A previously issued bearer token presented for renewal.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub token: String,
}

impl RefreshRequest {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// Why an authentication attempt was turned down.
///
/// Messages are static and never reveal which part of the check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AuthFailure {
    #[display("Invalid credentials")]
    InvalidCredentials,
    #[display("Error generating token")]
    TokenGeneration,
    #[display("Invalid token")]
    InvalidToken,
    #[display("User not found")]
    UserNotFound,
}

/// Outcome of [`login`](crate::Authorizer::login) or [`refresh`](crate::Authorizer::refresh).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Success {
        token: String,
        principal_id: PrincipalId,
    },
    Failure(AuthFailure),
}

impl AuthResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Success { token, .. } => Some(token),
            Self::Failure(_) => None,
        }
    }

    #[must_use]
    pub fn principal_id(&self) -> Option<PrincipalId> {
        match self {
            Self::Success { principal_id, .. } => Some(*principal_id),
            Self::Failure(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<AuthFailure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(reason) => Some(*reason),
        }
    }
}
