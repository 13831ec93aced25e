use url::Url;

use crate::OAuthError;

pub(crate) const DEFAULT_ERROR_HTML: &str = include_str!("html/error.html");

#[derive(Debug, Clone)]
pub struct LocalServerConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    /// Error page template; `{{message}}` is replaced with the escaped error.
    pub error_html: String,
}

impl LocalServerConfig {
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            path: normalize_path(path.into()),
            error_html: DEFAULT_ERROR_HTML.to_string(),
        }
    }

    pub fn from_redirect_uri(redirect_uri: &str) -> Result<Self, OAuthError> {
        let url = Url::parse(redirect_uri)?;
        if url.scheme() != "http" {
            return Err(OAuthError::InvalidRedirectUri(
                "redirect uri must use http scheme".to_string(),
            ));
        }

        let host = url.host_str().ok_or_else(|| {
            OAuthError::InvalidRedirectUri("redirect uri is missing host".to_string())
        })?;

        let port = url.port_or_known_default().ok_or_else(|| {
            OAuthError::InvalidRedirectUri("redirect uri is missing port".to_string())
        })?;

        Ok(Self::new(host, port, url.path()))
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }

    pub fn with_error_html(mut self, html: impl Into<String>) -> Self {
        self.error_html = html.into();
        self
    }
}

fn normalize_path(path: String) -> String {
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}
