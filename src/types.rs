use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `302 Found` response the caller should emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    location: String,
}

impl Redirect {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn status_code(&self) -> u16 {
        302
    }

    pub fn to_http_head(&self) -> String {
        format!(
            "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\n\r\n",
            self.location
        )
    }
}

/// Where the browser goes next after an authorize or exchange step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStep {
    /// Auto-redirect is on: send this redirect.
    Redirect(Redirect),
    /// Auto-redirect is off: the caller decides what to do with the URL.
    Url(String),
}

impl AuthStep {
    pub(crate) fn new(url: String, auto_redirect: bool) -> Self {
        if auto_redirect {
            Self::Redirect(Redirect::new(url))
        } else {
            Self::Url(url)
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Redirect(redirect) => redirect.location(),
            Self::Url(url) => url,
        }
    }

    pub fn into_url(self) -> String {
        match self {
            Self::Redirect(redirect) => redirect.location,
            Self::Url(url) => url,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }
}

/// Which branch a `login()` call took and what it produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// No code or token was supplied.
    Authorize(AuthStep),
    /// A code was exchanged. `None` means the exchange failed.
    Exchange(Option<AuthStep>),
    /// A token was used to fetch the profile. `None` means the fetch failed.
    Profile(Option<Value>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Typed view over the `@me` response. Unrecognized fields land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub global_name: Option<String>,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub verified: Option<bool>,
    pub locale: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Loose truthiness used for decoded provider responses: null, `false`,
/// zero, empty strings, empty arrays and empty objects are all "no data".
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty() && text != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AuthStep, Redirect, TokenResponse, UserProfile, is_truthy};

    #[test]
    fn auth_step_follows_auto_redirect() {
        let step = AuthStep::new("https://x.test/a".to_string(), true);
        assert!(step.is_redirect());
        assert_eq!(step.url(), "https://x.test/a");

        let step = AuthStep::new("https://x.test/a".to_string(), false);
        assert_eq!(step, AuthStep::Url("https://x.test/a".to_string()));
    }

    #[test]
    fn redirect_renders_found_head() {
        let redirect = Redirect::new("https://x.test/cb?token=T1");
        assert_eq!(redirect.status_code(), 302);
        assert!(
            redirect
                .to_http_head()
                .starts_with("HTTP/1.1 302 Found\r\nLocation: https://x.test/cb?token=T1\r\n")
        );
    }

    #[test]
    fn empty_values_are_falsy() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!({})));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!({"id": "1"})));
        assert!(is_truthy(&json!("x")));
    }

    #[test]
    fn token_response_keeps_unknown_fields() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "T1",
            "token_type": "Bearer",
            "expires_in": 604800,
            "webhook": {"id": "9"}
        }))
        .unwrap();
        assert_eq!(token.access_token, "T1");
        assert_eq!(token.expires_in, Some(604800));
        assert!(token.extra.contains_key("webhook"));
    }

    #[test]
    fn user_profile_decodes_minimal_record() {
        let profile: UserProfile =
            serde_json::from_value(json!({"id": "1", "username": "u"})).unwrap();
        assert_eq!(profile.id, "1");
        assert_eq!(profile.username, "u");
        assert!(profile.email.is_none());
    }
}
