#![doc = include_str!("../README.md")]

pub mod authorizer;
pub mod config;
pub mod error;
#[cfg(feature = "axum")]
pub mod middleware;
pub mod store;
pub mod token;
pub mod types;

// Re-exports for convenient access
pub use authorizer::Authorizer;
pub use config::AuthConfig;
pub use error::{Error, StoreError};
pub use store::{IdentityStore, MemoryIdentityStore, hash_secret};
pub use token::{Claims, Clock, TokenError, TokenSigner, VerifiedClaims};
pub use types::{
    AuthFailure, AuthResult, LoginRequest, Principal, PrincipalId, RefreshRequest, Role, RoleId,
};
