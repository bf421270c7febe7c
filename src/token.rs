use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::config::AuthConfig;
use crate::types::{Principal, PrincipalId};

/// Why a token could not be minted or verified.
///
/// Kept internal to the authorization flow: callers only ever see
/// "Invalid token" or "Error generating token".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("signature verification failed")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("token subject is missing or not a valid principal id")]
    InvalidSubject,
    #[error("signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed(e.to_string()),
        }
    }
}

/// Claims written into every minted token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    /// Principal id as a decimal string.
    pub sub: String,
    pub email: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiration, Unix seconds.
    pub exp: i64,
}

// Tokens issued by the previous service carry the subject in `unique_name` /
// `nameid` and have no `sub`, so every subject field is optional here.
#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    unique_name: Option<String>,
    #[serde(default)]
    nameid: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    nbf: Option<i64>,
    exp: i64,
}

/// Claims from a token whose signature and expiration have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub principal_id: PrincipalId,
    pub email: Option<String>,
    pub issued_at: Option<i64>,
    pub expires_at: i64,
}

/// Source of the current instant for minting and expiry checks.
pub type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// HS256 token minting and verification with the process-wide secret.
#[derive(Clone)]
pub struct TokenSigner {
    header: Header,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    clock: Clock,
}

impl TokenSigner {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `verify`, with no leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            header: Header::new(Algorithm::HS256),
            encoding: EncodingKey::from_secret(&config.secret),
            decoding: DecodingKey::from_secret(&config.secret),
            validation,
            lifetime: Duration::days(config.token_lifetime_days),
            clock: Arc::new(OffsetDateTime::now_utc),
        }
    }

    /// Replace the wall clock returned by [`now`](Self::now).
    #[must_use]
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> OffsetDateTime + Send + Sync + 'static,
    ) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Current instant according to this signer's clock.
    #[must_use]
    pub fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }

    /// Mints a token for `principal` issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if the expiration overflows or encoding fails.
    pub fn mint(&self, principal: &Principal, now: OffsetDateTime) -> Result<String, TokenError> {
        let exp = self.expiration(now)?;
        self.sign(principal, now, exp)
    }

    /// Mints the replacement for a token expiring at `previous_exp`.
    ///
    /// The new expiration is strictly later than `previous_exp`, so a renewal
    /// within the same second as the original mint still yields a new token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if the expiration overflows or encoding fails.
    pub fn renew(
        &self,
        principal: &Principal,
        now: OffsetDateTime,
        previous_exp: i64,
    ) -> Result<String, TokenError> {
        let exp = self.expiration(now)?.max(previous_exp.saturating_add(1));
        self.sign(principal, now, exp)
    }

    fn expiration(&self, now: OffsetDateTime) -> Result<i64, TokenError> {
        now.checked_add(self.lifetime)
            .map(OffsetDateTime::unix_timestamp)
            .ok_or_else(|| TokenError::Signing("expiration out of range".into()))
    }

    fn sign(
        &self,
        principal: &Principal,
        now: OffsetDateTime,
        exp: i64,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: principal.id.to_string(),
            email: principal.email.clone(),
            iat: now.unix_timestamp(),
            exp,
        };

        jsonwebtoken::encode(&self.header, &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies signature and expiration as of `now`.
    ///
    /// A token is valid only while `exp` is strictly later than `now`, and,
    /// when it carries `nbf`, from that instant on.
    ///
    /// # Errors
    ///
    /// Returns the specific [`TokenError`] describing why the token was rejected.
    pub fn verify(&self, token: &str, now: OffsetDateTime) -> Result<VerifiedClaims, TokenError> {
        let raw = jsonwebtoken::decode::<RawClaims>(token, &self.decoding, &self.validation)?
            .claims;

        let now = now.unix_timestamp();
        if raw.exp <= now {
            return Err(TokenError::Expired);
        }
        if raw.nbf.is_some_and(|nbf| nbf > now) {
            return Err(TokenError::NotYetValid);
        }

        let principal_id: PrincipalId = raw
            .sub
            .or(raw.unique_name)
            .or(raw.nameid)
            .ok_or(TokenError::InvalidSubject)?
            .parse()
            .map_err(|_| TokenError::InvalidSubject)?;
        if !principal_id.is_valid() {
            return Err(TokenError::InvalidSubject);
        }

        Ok(VerifiedClaims {
            principal_id,
            email: raw.email,
            issued_at: raw.iat,
            expires_at: raw.exp,
        })
    }

    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &self.header.alg)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
