use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::types::AuthFailure;

/// HTTP-facing errors for the auth routes and extractor.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No bearer credential was presented.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Credentials or token were turned down.
    #[error("{0}")]
    Rejected(AuthFailure),

    /// Malformed or incomplete request body.
    #[error("{0}")]
    BadRequest(String),

    /// Identity store operation failed.
    #[error("Identity store error: {0}")]
    Store(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated | Self::Rejected(_) => {
                (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            Self::Store(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Auth internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

impl From<crate::error::Error> for AuthError {
    fn from(e: crate::error::Error) -> Self {
        match e {
            crate::error::Error::InvalidRequest(msg) => Self::BadRequest(msg),
            crate::error::Error::Config(msg) => Self::Config(msg),
            crate::error::Error::Store(source) => Self::Store(source.to_string()),
        }
    }
}
