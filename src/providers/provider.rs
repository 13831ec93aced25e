/// Endpoints and fixed parameters of an OAuth 2.0 identity provider.
pub trait OAuthProvider: Send + Sync {
    fn id(&self) -> &str;
    fn authorize_url(&self) -> &str;
    fn token_url(&self) -> &str;
    /// Endpoint returning the authenticated user's profile.
    fn profile_url(&self) -> &str;
    fn default_scope(&self) -> &str;

    fn authorize_params(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}
