/// Boxed error returned by [`IdentityStore`](crate::store::IdentityStore) implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Faults raised by the authorization core.
///
/// Failed authentication is not an error: it is reported as
/// [`AuthResult::Failure`](crate::types::AuthResult::Failure).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Caller supplied empty or out-of-range input. Detected before any store access.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or invalid signing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Identity store lookup failed.
    #[error("Identity store error: {0}")]
    Store(#[source] StoreError),
}

impl Error {
    pub(crate) fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}
