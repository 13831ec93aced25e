use url::Url;

use crate::OAuthError;

/// One outbound call: target endpoint, ordered parameters and bearer token.
///
/// An intent is consumed by whatever sends or renders it, so parameters can
/// never leak from one call into the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIntent {
    target_url: String,
    params: Option<Vec<(String, String)>>,
    bearer_token: Option<String>,
}

impl RequestIntent {
    /// A parameterless intent; performed as a GET.
    pub fn get(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            params: None,
            bearer_token: None,
        }
    }

    /// An intent carrying parameters; performed as a form-encoded POST.
    pub fn post(target_url: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            target_url: target_url.into(),
            params: Some(params),
            bearer_token: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    /// Appends `key` only when a value is present.
    pub fn with_optional_param(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_param(key, value),
            None => self,
        }
    }

    pub fn with_bearer(mut self, token: Option<impl Into<String>>) -> Self {
        self.bearer_token = token.map(Into::into);
        self
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn params(&self) -> Option<&[(String, String)]> {
        self.params.as_deref()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Renders the endpoint with its parameters as a query string, in
    /// insertion order. Without parameters the bare endpoint is returned.
    pub fn into_url(self) -> Result<String, OAuthError> {
        let params = match self.params {
            Some(params) if !params.is_empty() => params,
            _ => {
                if self.target_url.is_empty() {
                    return Err(OAuthError::Url(url::ParseError::EmptyHost));
                }
                return Ok(self.target_url);
            }
        };

        let mut url = Url::parse(&self.target_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }

    pub(crate) fn into_parts(self) -> (String, Option<Vec<(String, String)>>, Option<String>) {
        (self.target_url, self.params, self.bearer_token)
    }
}

#[cfg(test)]
mod tests {
    use super::RequestIntent;

    #[test]
    fn into_url_encodes_params_in_insertion_order() {
        let url = RequestIntent::get("https://discord.com/api/oauth2/authorize")
            .with_param("response_type", "code")
            .with_param("scope", "identify guilds email")
            .with_param("redirect_uri", "http://localhost/cb")
            .into_url()
            .unwrap();
        assert_eq!(
            url,
            "https://discord.com/api/oauth2/authorize?response_type=code&scope=identify+guilds+email&redirect_uri=http%3A%2F%2Flocalhost%2Fcb"
        );
    }

    #[test]
    fn into_url_without_params_is_bare_endpoint() {
        let url = RequestIntent::get("https://discord.com/api/users/@me")
            .into_url()
            .unwrap();
        assert_eq!(url, "https://discord.com/api/users/@me");

        let url = RequestIntent::post("https://discord.com/api/oauth2/token", Vec::new())
            .into_url()
            .unwrap();
        assert_eq!(url, "https://discord.com/api/oauth2/token");
    }

    #[test]
    fn into_url_requires_target() {
        assert!(RequestIntent::get("").into_url().is_err());
    }

    #[test]
    fn optional_param_is_skipped_when_absent() {
        let intent = RequestIntent::get("https://x.test/")
            .with_optional_param("client_id", None)
            .with_optional_param("scope", Some("identify"));
        assert_eq!(
            intent.params(),
            Some(&[("scope".to_string(), "identify".to_string())][..])
        );
    }

    #[test]
    fn rendering_consumes_the_intent() {
        let intent = RequestIntent::get("https://x.test/a").with_param("scope", "one");
        let first = intent.clone().into_url().unwrap();
        let fresh = RequestIntent::get("https://x.test/a").into_url().unwrap();
        assert_eq!(first, "https://x.test/a?scope=one");
        assert_eq!(fresh, "https://x.test/a");
    }
}
