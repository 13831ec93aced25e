use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use reqwest::{
    Client, RequestBuilder,
    header::{AUTHORIZATION, HeaderName, HeaderValue},
};

use crate::OAuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A fully described HTTP call handed to an [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Form fields sent as an `application/x-www-form-urlencoded` body.
    pub form: Option<Vec<(String, String)>>,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Sends a request and returns the raw response body regardless of status.
pub trait HttpTransport: Send + Sync {
    fn send(
        &self,
        request: OutboundRequest,
    ) -> impl Future<Output = Result<String, OAuthError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(force_ipv4: bool, timeout: Option<Duration>) -> Result<Self, OAuthError> {
        let mut builder = Client::builder();
        if force_ipv4 {
            // Binding the unspecified v4 address restricts connects to IPv4 peers.
            builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    pub fn with_http_client(http: Client) -> Self {
        Self { http }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<String, OAuthError> {
        let OutboundRequest {
            method,
            url,
            headers,
            form,
        } = request;

        let mut builder = match method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
        };
        builder = apply_headers(builder, &headers)?;
        if let Some(form) = &form {
            builder = builder.form(form);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "provider returned non-success status");
        }
        Ok(response.text().await?)
    }
}

fn apply_headers(
    mut builder: RequestBuilder,
    headers: &[(String, String)],
) -> Result<RequestBuilder, OAuthError> {
    for (name, value) in headers {
        let name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| OAuthError::InvalidHeader {
                name: name.clone(),
                value: value.clone(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|_| OAuthError::InvalidHeader {
            name: name.to_string(),
            value: if name == AUTHORIZATION {
                "<redacted>".to_string()
            } else {
                value.clone()
            },
        })?;
        builder = builder.header(name, header_value);
    }
    Ok(builder)
}
