use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use super::error::AuthError;
use crate::token::TokenSigner;
use crate::types::{AuthFailure, PrincipalId};

/// Principal authenticated by an `Authorization: Bearer` token.
///
/// Use as an Axum extractor in route handlers. Returns `401 Unauthorized`
/// if the header is missing or the token fails verification. The state must
/// yield an `Arc<TokenSigner>` via [`FromRef`]; expiry is judged by that
/// signer's clock.
///
/// Only the token is checked; combine with
/// [`Authorizer::has_access`](crate::Authorizer::has_access) for role checks.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_only(
///     State(app): State<AppState>,
///     principal: BearerPrincipal,
/// ) -> Result<String, StatusCode> {
///     if !app.authorizer.has_access(principal.principal_id, "Admin").await.unwrap_or(false) {
///         return Err(StatusCode::FORBIDDEN);
///     }
///     Ok(format!("Hello, principal {}", principal.principal_id))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BearerPrincipal {
    pub principal_id: PrincipalId,
    pub email: Option<String>,
    /// Expiration, Unix seconds.
    pub expires_at: i64,
}

impl<St> FromRequestParts<St> for BearerPrincipal
where
    Arc<TokenSigner>: FromRef<St>,
    St: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &St) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AuthError::Unauthenticated)?;

        let signer = Arc::<TokenSigner>::from_ref(state);
        let claims = signer
            .verify(bearer.token(), signer.now())
            .map_err(|e| {
                tracing::debug!(reason = %e, "Bearer token rejected");
                AuthError::Rejected(AuthFailure::InvalidToken)
            })?;

        Ok(Self {
            principal_id: claims.principal_id,
            email: claims.email,
            expires_at: claims.expires_at,
        })
    }
}
