use std::time::Duration;

use serde::Deserialize;

use crate::OAuthError;

/// Session configuration.
///
/// Every field is optional. A missing `redirect_uri` is derived from the
/// inbound request when the session is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub redirect_uri: Option<String>,
    pub access_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub auto_redirect: bool,
    pub force_ipv4: bool,
    pub timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redirect_uri: None,
            access_token: None,
            client_id: None,
            client_secret: None,
            auto_redirect: true,
            force_ipv4: true,
            timeout: None,
        }
    }
}

/// Wire shape of the configuration record. Unknown keys are an error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSessionConfig {
    redirect_uri: Option<String>,
    access_token: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    auto_redirect: Option<bool>,
    force_ipv4: Option<bool>,
    timeout_secs: Option<u64>,
}

impl From<RawSessionConfig> for SessionConfig {
    fn from(raw: RawSessionConfig) -> Self {
        let defaults = Self::default();
        Self {
            redirect_uri: raw.redirect_uri,
            access_token: raw.access_token,
            client_id: raw.client_id,
            client_secret: raw.client_secret,
            auto_redirect: raw.auto_redirect.unwrap_or(defaults.auto_redirect),
            force_ipv4: raw.force_ipv4.unwrap_or(defaults.force_ipv4),
            timeout: raw.timeout_secs.map(Duration::from_secs),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a camelCase JSON record such as
    /// `{"clientId": "...", "clientSecret": "...", "autoRedirect": false}`.
    pub fn from_json(json: &str) -> Result<Self, OAuthError> {
        let raw: RawSessionConfig =
            serde_json::from_str(json).map_err(|err| OAuthError::Config(err.to_string()))?;
        Ok(raw.into())
    }

    /// Builds a config from string key/value pairs using the same key names
    /// as [`SessionConfig::from_json`].
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, OAuthError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "redirectUri" => config.redirect_uri = Some(value),
                "accessToken" => config.access_token = Some(value),
                "clientId" => config.client_id = Some(value),
                "clientSecret" => config.client_secret = Some(value),
                "autoRedirect" => config.auto_redirect = parse_bool("autoRedirect", &value)?,
                "forceIpv4" => config.force_ipv4 = parse_bool("forceIpv4", &value)?,
                "timeoutSecs" => {
                    let secs = value.parse::<u64>().map_err(|_| {
                        OAuthError::Config(format!("timeoutSecs must be an integer, got {value:?}"))
                    })?;
                    config.timeout = Some(Duration::from_secs(secs));
                }
                other => return Err(OAuthError::Config(format!("unknown config key `{other}`"))),
            }
        }
        Ok(config)
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_auto_redirect(mut self, auto_redirect: bool) -> Self {
        self.auto_redirect = auto_redirect;
        self
    }

    pub fn with_force_ipv4(mut self, force_ipv4: bool) -> Self {
        self.force_ipv4 = force_ipv4;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, OAuthError> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(OAuthError::Config(format!(
            "{key} must be a boolean, got {value:?}"
        ))),
    }
}
