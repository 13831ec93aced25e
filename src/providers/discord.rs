use crate::OAuthProvider;

const API_BASE: &str = "https://discord.com/api";
const AUTHORIZE_PATH: &str = "/oauth2/authorize";
const TOKEN_PATH: &str = "/oauth2/token";
const PROFILE_PATH: &str = "/users/@me";

const DEFAULT_SCOPE: &str = "identify guilds email";

#[derive(Debug, Clone)]
pub struct DiscordProvider {
    authorize_url: String,
    token_url: String,
    profile_url: String,
}

impl Default for DiscordProvider {
    fn default() -> Self {
        Self::with_api_base(API_BASE)
    }
}

impl OAuthProvider for DiscordProvider {
    fn id(&self) -> &str {
        "discord"
    }

    fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    fn token_url(&self) -> &str {
        &self.token_url
    }

    fn profile_url(&self) -> &str {
        &self.profile_url
    }

    fn default_scope(&self) -> &str {
        DEFAULT_SCOPE
    }
}

impl DiscordProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roots every endpoint under `api_base` instead of `https://discord.com/api`.
    pub fn with_api_base(api_base: impl AsRef<str>) -> Self {
        let base = api_base.as_ref().trim_end_matches('/');
        Self {
            authorize_url: format!("{base}{AUTHORIZE_PATH}"),
            token_url: format!("{base}{TOKEN_PATH}"),
            profile_url: format!("{base}{PROFILE_PATH}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DiscordProvider;
    use crate::OAuthProvider;

    #[test]
    fn default_endpoints_point_at_discord() {
        let provider = DiscordProvider::new();
        assert_eq!(
            provider.authorize_url(),
            "https://discord.com/api/oauth2/authorize"
        );
        assert_eq!(provider.token_url(), "https://discord.com/api/oauth2/token");
        assert_eq!(provider.profile_url(), "https://discord.com/api/users/@me");
        assert_eq!(provider.default_scope(), "identify guilds email");
    }

    #[test]
    fn api_base_trailing_slash_is_ignored() {
        let provider = DiscordProvider::with_api_base("http://127.0.0.1:9000/");
        assert_eq!(provider.token_url(), "http://127.0.0.1:9000/oauth2/token");
    }
}
