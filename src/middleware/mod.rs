//! Axum HTTP surface for the authorization core.
//!
//! Mounts the login and refresh endpoints and provides a bearer-token extractor
//! for protected routes.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use access_auth::{AuthConfig, Authorizer, MemoryIdentityStore};
//! use access_auth::middleware::{AuthRoutesConfig, BearerPrincipal, auth_routes};
//!
//! // 1. Implement IdentityStore for your persistence layer
//! // 2. Build the authorizer once at startup
//! let authorizer = Arc::new(Authorizer::new(store, &AuthConfig::from_env()?));
//!
//! // 3. Mount auth routes
//! let app = axum::Router::new()
//!     .merge(auth_routes(AuthRoutesConfig::default(), authorizer.clone()));
//!
//! // 4. Use BearerPrincipal in handlers whose state yields `Arc<TokenSigner>`
//! async fn me(principal: BearerPrincipal) -> String {
//!     principal.principal_id.to_string()
//! }
//! ```

mod config;
mod error;
mod extractor;
mod routes;
mod state;

pub use config::AuthRoutesConfig;
pub use error::AuthError;
pub use extractor::BearerPrincipal;
pub use routes::{TokenBody, auth_routes};
