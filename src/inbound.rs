use url::{Url, form_urlencoded};

use crate::OAuthError;

/// The parts of the inbound HTTP request the login flow reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub secure: bool,
    pub host: String,
    pub request_uri: String,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
}

impl InboundRequest {
    /// `host` is the raw `Host` header (port included when present) and
    /// `request_uri` is the path plus optional query string.
    pub fn new(secure: bool, host: impl Into<String>, request_uri: impl Into<String>) -> Self {
        let request_uri = request_uri.into();
        let query = request_uri
            .split_once('?')
            .map(|(_, query)| parse_pairs(query))
            .unwrap_or_default();
        Self {
            secure,
            host: host.into(),
            request_uri,
            query,
            form: Vec::new(),
        }
    }

    pub fn from_url(request_url: &str) -> Result<Self, OAuthError> {
        let url = Url::parse(request_url)?;
        let host = url.host_str().ok_or_else(|| {
            OAuthError::InvalidRedirectUri(format!("request url is missing host: {request_url}"))
        })?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let request_uri = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };
        Ok(Self::new(url.scheme() == "https", host, request_uri))
    }

    /// Attaches an `application/x-www-form-urlencoded` request body.
    pub fn with_form_body(mut self, body: &str) -> Self {
        self.form = parse_pairs(body);
        self
    }

    pub fn path(&self) -> &str {
        self.request_uri
            .split_once('?')
            .map_or(self.request_uri.as_str(), |(path, _)| path)
    }

    /// Scheme, host and path of the request with the query string dropped.
    pub fn redirect_uri(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}{}", self.host, self.path())
    }

    /// Query-string value for `key`. Empty values read as absent.
    pub fn query(&self, key: &str) -> Option<&str> {
        lookup(&self.query, key)
    }

    /// Form-body value for `key`. Empty values read as absent.
    pub fn form(&self, key: &str) -> Option<&str> {
        lookup(&self.form, key)
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn form_pairs(&self) -> &[(String, String)] {
        &self.form
    }
}

/// Inputs to [`OAuthSession::login`](crate::OAuthSession::login).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginParams {
    pub code: Option<String>,
    pub token: Option<String>,
}

impl LoginParams {
    pub fn new(code: Option<String>, token: Option<String>) -> Self {
        Self {
            code: code.filter(|value| !value.is_empty()),
            token: token.filter(|value| !value.is_empty()),
        }
    }

    pub fn from_request(request: &InboundRequest) -> Self {
        Self::new(
            request.query("code").map(str::to_string),
            request.query("token").map(str::to_string),
        )
    }
}

fn parse_pairs(input: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(input.as_bytes())
        .into_owned()
        .collect()
}

// Later duplicates win, matching how most servers collapse repeated keys.
fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{InboundRequest, LoginParams};

    #[test]
    fn redirect_uri_strips_query() {
        let request = InboundRequest::from_url("https://app.example/callback?code=abc").unwrap();
        assert_eq!(request.redirect_uri(), "https://app.example/callback");
    }

    #[test]
    fn redirect_uri_keeps_host_port_and_plain_http() {
        let request = InboundRequest::new(false, "localhost:8765", "/auth/discord?token=x&a=b");
        assert_eq!(request.redirect_uri(), "http://localhost:8765/auth/discord");
    }

    #[test]
    fn query_reads_decoded_values() {
        let request = InboundRequest::new(true, "app.example", "/cb?code=a%2Bb&token=&x=1");
        assert_eq!(request.query("code"), Some("a+b"));
        assert_eq!(request.query("token"), None);
        assert_eq!(request.query("missing"), None);
    }

    #[test]
    fn form_reads_body_values() {
        let request =
            InboundRequest::new(false, "app.example", "/cb").with_form_body("name=some+one&x=");
        assert_eq!(request.form("name"), Some("some one"));
        assert_eq!(request.form("x"), None);
        assert_eq!(request.query("name"), None);
    }

    #[test]
    fn login_params_treat_empty_as_absent() {
        let request = InboundRequest::new(false, "app.example", "/cb?code=&token=XYZ");
        let params = LoginParams::from_request(&request);
        assert_eq!(params.code, None);
        assert_eq!(params.token.as_deref(), Some("XYZ"));
    }
}
