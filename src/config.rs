use crate::error::Error;

/// Default token lifetime.
pub const DEFAULT_TOKEN_LIFETIME_DAYS: i64 = 7;

/// Minimum HS256 key length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Signing configuration, built once at process start.
///
/// The secret is a constructor parameter, so a config value that exists is a
/// config value that can sign. Use [`from_env()`](AuthConfig::from_env) for
/// convention-based setup, or [`new()`](AuthConfig::new) with `with_*` methods.
///
/// ```rust,ignore
/// let config = AuthConfig::new(std::env::var("JWT_SECRET")?)?
///     .with_token_lifetime_days(1)?;
/// let authorizer = Authorizer::new(store, &config);
/// ```
#[derive(Clone)]
pub struct AuthConfig {
    pub(crate) secret: Vec<u8>,
    pub(crate) token_lifetime_days: i64,
}

impl AuthConfig {
    /// Create a config from a signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the secret is blank or shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: impl Into<String>) -> Result<Self, Error> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(Error::Config("JWT secret is empty".into()));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "JWT secret too short: expected at least {MIN_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }
        Ok(Self {
            secret: secret.into_bytes(),
            token_lifetime_days: DEFAULT_TOKEN_LIFETIME_DAYS,
        })
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `JWT_SECRET`: HMAC signing secret (at least 32 bytes)
    ///
    /// # Optional env vars
    /// - `JWT_EXPIRATION_DAYS`: token lifetime in days (default: 7)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the secret is missing or invalid, or the
    /// lifetime is not a positive integer.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let secret =
            lookup("JWT_SECRET").ok_or_else(|| Error::Config("JWT_SECRET is required".into()))?;

        let mut config = Self::new(secret)?;

        if let Some(days) = lookup("JWT_EXPIRATION_DAYS") {
            let days: i64 = days
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("JWT_EXPIRATION_DAYS: {e}")))?;
            config = config.with_token_lifetime_days(days)?;
        }

        tracing::debug!(
            token_lifetime_days = config.token_lifetime_days,
            "Loaded signing configuration"
        );

        Ok(config)
    }

    /// Override the token lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `days` is not positive.
    pub fn with_token_lifetime_days(mut self, days: i64) -> Result<Self, Error> {
        if days <= 0 {
            return Err(Error::Config(format!(
                "token lifetime must be positive, got {days} days"
            )));
        }
        if days.checked_mul(86_400).is_none() {
            return Err(Error::Config(format!("token lifetime out of range: {days} days")));
        }
        self.token_lifetime_days = days;
        Ok(self)
    }

    #[must_use]
    pub fn token_lifetime_days(&self) -> i64 {
        self.token_lifetime_days
    }
}

// Manual Debug: never print the secret.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_lifetime_days", &self.token_lifetime_days)
            .finish()
    }
}
