use serde_json::Value;

use crate::transport::HttpMethod;
use crate::types::is_truthy;
use crate::{
    AuthStep, HttpTransport, InboundRequest, LoginOutcome, LoginParams, OAuthError, OAuthProvider,
    OutboundRequest, ReqwestTransport, RequestIntent, SessionConfig, TokenResponse, UserProfile,
};

const NO_ACCESS_TOKEN: &str = "No access token was found in token exchange.";
const NO_PROFILE_DATA: &str = "No data returned in @me response";

/// One login flow against a single provider.
///
/// A session holds scratch results for one logical operation at a time and is
/// not meant to be shared between concurrent requests; build one per request.
///
/// Flow failures are not `Err`s. They surface as `None`/`false` with an
/// optional message in [`OAuthSession::last_error`]. Transport errors and
/// undecodable bodies are logged and otherwise read as "no data".
#[derive(Debug, Clone)]
pub struct OAuthSession<P: OAuthProvider, T: HttpTransport = ReqwestTransport> {
    provider: P,
    config: SessionConfig,
    redirect_uri: String,
    access_token: Option<String>,
    transport: T,
    profile_data: Option<Value>,
    last_error: Option<String>,
}

impl<P: OAuthProvider> OAuthSession<P, ReqwestTransport> {
    /// Builds a session with a reqwest transport configured from `config`.
    ///
    /// `inbound` supplies the redirect URI when `config` has none.
    pub fn new(
        provider: P,
        config: SessionConfig,
        inbound: Option<&InboundRequest>,
    ) -> Result<Self, OAuthError> {
        let transport = ReqwestTransport::new(config.force_ipv4, config.timeout)?;
        Self::with_transport(provider, config, inbound, transport)
    }
}

impl<P: OAuthProvider, T: HttpTransport> OAuthSession<P, T> {
    pub fn with_transport(
        provider: P,
        config: SessionConfig,
        inbound: Option<&InboundRequest>,
        transport: T,
    ) -> Result<Self, OAuthError> {
        let redirect_uri = match (&config.redirect_uri, inbound) {
            (Some(redirect_uri), _) => redirect_uri.clone(),
            (None, Some(inbound)) => inbound.redirect_uri(),
            (None, None) => return Err(OAuthError::MissingRedirectUri),
        };
        let access_token = config.access_token.clone();

        Ok(Self {
            provider,
            config,
            redirect_uri,
            access_token,
            transport,
            profile_data: None,
            last_error: None,
        })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.access_token = Some(access_token.into());
    }

    /// Decoded body of the last successful profile fetch.
    pub fn profile_data(&self) -> Option<&Value> {
        self.profile_data.as_ref()
    }

    /// Typed view of [`OAuthSession::profile_data`], when it has the expected shape.
    pub fn profile(&self) -> Option<UserProfile> {
        self.profile_data
            .as_ref()
            .and_then(|data| serde_json::from_value(data.clone()).ok())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Runs exactly one step of the flow based on what the callback carried:
    /// nothing starts authorization, a `code` is exchanged (even when a
    /// `token` is also present) and a lone `token` fetches the profile.
    pub async fn login(&mut self, params: &LoginParams) -> Result<LoginOutcome, OAuthError> {
        match (params.code.as_deref(), params.token.as_deref()) {
            (None, None) => {
                tracing::debug!(provider = self.provider.id(), "login: starting authorization");
                Ok(LoginOutcome::Authorize(self.authorization(None)?))
            }
            (Some(code), _) => {
                tracing::debug!(provider = self.provider.id(), "login: exchanging code");
                Ok(LoginOutcome::Exchange(self.exchange_code(code).await))
            }
            (None, Some(token)) => {
                tracing::debug!(provider = self.provider.id(), "login: fetching profile");
                self.set_access_token(token);
                self.fetch_profile().await;
                Ok(LoginOutcome::Profile(self.profile_data.clone()))
            }
        }
    }

    /// Builds the authorize URL. `scope` falls back to the provider default.
    pub fn authorization(&self, scope: Option<&str>) -> Result<AuthStep, OAuthError> {
        let scope = scope.unwrap_or(self.provider.default_scope());

        let mut intent = RequestIntent::get(self.provider.authorize_url());
        for (key, value) in self.provider.authorize_params() {
            intent = intent.with_param(key, value);
        }
        let url = intent
            .with_param("response_type", "code")
            .with_param("scope", scope)
            .with_optional_param("client_id", self.config.client_id.as_deref())
            .with_param("redirect_uri", &self.redirect_uri)
            .into_url()?;

        Ok(AuthStep::new(url, self.config.auto_redirect))
    }

    /// Trades an authorization code for an access token.
    ///
    /// On success the token is handed back to the browser as a `token` query
    /// parameter on the redirect URI, to be submitted to [`OAuthSession::login`]
    /// on the next request. It is not kept on the session. The token ends up in
    /// browser history and server logs this way.
    pub async fn exchange_code(&mut self, code: &str) -> Option<AuthStep> {
        if code.is_empty() {
            return None;
        }

        let intent = RequestIntent::post(
            self.provider.token_url(),
            vec![
                ("grant_type".to_string(), "authorization_code".to_string()),
                ("code".to_string(), code.to_string()),
            ],
        )
        .with_optional_param("client_id", self.config.client_id.as_deref())
        .with_optional_param("client_secret", self.config.client_secret.as_deref())
        .with_param("redirect_uri", &self.redirect_uri)
        .with_bearer(self.access_token.clone());

        let token = self
            .perform_request(intent, &[])
            .await
            .and_then(|response| serde_json::from_value::<TokenResponse>(response).ok());

        let Some(token) = token else {
            tracing::warn!(provider = self.provider.id(), "token exchange returned no access token");
            self.last_error = Some(NO_ACCESS_TOKEN.to_string());
            return None;
        };

        tracing::debug!(
            provider = self.provider.id(),
            token_type = token.token_type.as_deref().unwrap_or("unknown"),
            "token exchange succeeded"
        );
        let url = format!("{}?token={}", self.redirect_uri, token.access_token);
        Some(AuthStep::new(url, self.config.auto_redirect))
    }

    /// Fetches the authenticated user's profile with the session's bearer token.
    pub async fn fetch_profile(&mut self) -> bool {
        let intent =
            RequestIntent::get(self.provider.profile_url()).with_bearer(self.access_token.clone());

        match self.perform_request(intent, &[]).await {
            Some(data) if is_truthy(&data) => {
                self.profile_data = Some(data);
                true
            }
            _ => {
                tracing::warn!(provider = self.provider.id(), "profile fetch returned no data");
                self.profile_data = None;
                self.last_error = Some(NO_PROFILE_DATA.to_string());
                false
            }
        }
    }

    /// Sends `intent` and decodes the body as JSON.
    ///
    /// Intents with parameters go out as form-encoded POSTs, the rest as GETs.
    /// `Accept: application/json` is always sent, plus `Authorization: Bearer`
    /// when the intent carries a token. Returns `None` when the intent has no
    /// target, the transport fails or the body is not JSON.
    pub async fn perform_request(
        &self,
        intent: RequestIntent,
        extra_headers: &[(String, String)],
    ) -> Option<Value> {
        let (url, params, bearer_token) = intent.into_parts();
        if url.is_empty() {
            tracing::debug!("request skipped: no target url");
            return None;
        }

        let mut headers = extra_headers.to_vec();
        headers.push(("Accept".to_string(), "application/json".to_string()));
        if let Some(token) = bearer_token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let method = if params.is_some() {
            HttpMethod::Post
        } else {
            HttpMethod::Get
        };
        tracing::debug!(provider = self.provider.id(), %url, ?method, "sending provider request");

        let request = OutboundRequest {
            method,
            url,
            headers,
            form: params,
        };
        let url = request.url.clone();

        let body = match self.transport.send(request).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(%url, error = %err, "provider request failed");
                return None;
            }
        };

        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(%url, error = %err, "provider response is not valid json");
                None
            }
        }
    }
}
