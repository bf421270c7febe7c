use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use super::config::AuthRoutesConfig;
use super::error::AuthError;
use super::state::AuthState;
use crate::authorizer::Authorizer;
use crate::store::IdentityStore;
use crate::types::{AuthResult, LoginRequest, PrincipalId, RefreshRequest};

/// Success body for login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenBody {
    pub token: String,
    pub user_id: PrincipalId,
}

/// Create the login / refresh router.
///
/// - `POST {auth_path}/login` with `{"username", "password"}`
/// - `POST {auth_path}/refresh-token` with `{"token"}`
///
/// Both answer `200` with [`TokenBody`], `401` with the failure reason, or `400`
/// for a malformed body.
pub fn auth_routes<S>(config: AuthRoutesConfig, authorizer: Arc<Authorizer<S>>) -> Router
where
    S: IdentityStore,
{
    let auth_path = config.auth_path;
    let state = AuthState { authorizer };

    Router::new()
        .route(&format!("{auth_path}/login"), post(login::<S>))
        .route(&format!("{auth_path}/refresh-token"), post(refresh::<S>))
        .with_state(state)
}

// ── Login ──────────────────────────────────────────────────────────

async fn login<S: IdentityStore>(
    State(state): State<AuthState<S>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenBody>, AuthError> {
    let Json(request) = body.map_err(bad_body)?;
    let result = state.authorizer.login(&request).await?;
    token_response(result)
}

// ── Refresh ────────────────────────────────────────────────────────

async fn refresh<S: IdentityStore>(
    State(state): State<AuthState<S>>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenBody>, AuthError> {
    let Json(request) = body.map_err(bad_body)?;
    let result = state.authorizer.refresh(&request).await?;
    token_response(result)
}

// ── Helpers ────────────────────────────────────────────────────────

fn token_response(result: AuthResult) -> Result<Json<TokenBody>, AuthError> {
    match result {
        AuthResult::Success {
            token,
            principal_id,
        } => Ok(Json(TokenBody {
            token,
            user_id: principal_id,
        })),
        AuthResult::Failure(reason) => {
            tracing::debug!(reason = %reason, "Auth request rejected");
            Err(AuthError::Rejected(reason))
        }
    }
}

fn bad_body(rejection: JsonRejection) -> AuthError {
    AuthError::BadRequest(rejection.body_text())
}
