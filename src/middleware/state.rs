use std::sync::Arc;

use axum::extract::FromRef;

use crate::authorizer::Authorizer;
use crate::store::IdentityStore;
use crate::token::TokenSigner;

/// Shared state for auth route handlers.
pub(super) struct AuthState<S> {
    pub(super) authorizer: Arc<Authorizer<S>>,
}

// Manual Clone: avoid derive adding an `S: Clone` bound.
impl<S> Clone for AuthState<S> {
    fn clone(&self) -> Self {
        Self {
            authorizer: self.authorizer.clone(),
        }
    }
}

// BearerPrincipal requires the signer to be extractable from state
impl<S: IdentityStore> FromRef<AuthState<S>> for Arc<TokenSigner> {
    fn from_ref(state: &AuthState<S>) -> Self {
        state.authorizer.signer().clone()
    }
}
