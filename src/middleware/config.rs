/// Settings for [`auth_routes`](super::auth_routes).
#[derive(Debug, Clone)]
pub struct AuthRoutesConfig {
    pub(super) auth_path: String,
}

impl Default for AuthRoutesConfig {
    fn default() -> Self {
        Self {
            auth_path: "/api/auth".into(),
        }
    }
}

impl AuthRoutesConfig {
    /// Override the route prefix (default: `/api/auth`).
    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.auth_path = path.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn auth_path(&self) -> &str {
        &self.auth_path
    }
}
