use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
};

use crate::{
    AuthStep, HttpTransport, InboundRequest, LoginOutcome, LoginParams, OAuthError, OAuthProvider,
    OAuthSession, SessionConfig,
};

pub(super) struct LocalServerState<P, T> {
    pub(super) provider: P,
    pub(super) session_config: Arc<SessionConfig>,
    pub(super) transport: T,
    pub(super) fallback_host: String,
    pub(super) error_html: Arc<str>,
}

impl<P: Clone, T: Clone> Clone for LocalServerState<P, T> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            session_config: self.session_config.clone(),
            transport: self.transport.clone(),
            fallback_host: self.fallback_host.clone(),
            error_html: self.error_html.clone(),
        }
    }
}

pub(super) async fn login_handler<P, T>(
    State(state): State<LocalServerState<P, T>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response
where
    P: OAuthProvider + Clone + 'static,
    T: HttpTransport + Clone + 'static,
{
    let inbound = inbound_request(&headers, &uri, &state.fallback_host);
    let params = LoginParams::from_request(&inbound);

    // Sessions carry per-request scratch state, so each request gets its own.
    let mut session = match OAuthSession::with_transport(
        state.provider.clone(),
        (*state.session_config).clone(),
        Some(&inbound),
        state.transport.clone(),
    ) {
        Ok(session) => session,
        Err(error) => return outcome_response(Err(error), None, &state.error_html),
    };

    let outcome = session.login(&params).await;
    outcome_response(outcome, session.last_error(), &state.error_html)
}

pub(super) async fn fallback_handler<P, T>(
    State(state): State<LocalServerState<P, T>>,
) -> impl IntoResponse
where
    P: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    (
        StatusCode::NOT_FOUND,
        Html(render_error(&state.error_html, "not found")),
    )
}

pub(super) fn inbound_request(headers: &HeaderMap, uri: &Uri, fallback_host: &str) -> InboundRequest {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(fallback_host);
    let request_uri = uri.path_and_query().map_or("/", |value| value.as_str());
    InboundRequest::new(false, host, request_uri)
}

pub(super) fn outcome_response(
    outcome: Result<LoginOutcome, OAuthError>,
    last_error: Option<&str>,
    error_html: &str,
) -> Response {
    match outcome {
        Ok(LoginOutcome::Authorize(step)) | Ok(LoginOutcome::Exchange(Some(step))) => {
            step_response(step)
        }
        Ok(LoginOutcome::Profile(Some(profile))) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(LoginOutcome::Exchange(None)) | Ok(LoginOutcome::Profile(None)) => {
            let message = last_error.unwrap_or("login failed");
            (
                StatusCode::BAD_GATEWAY,
                Html(render_error(error_html, message)),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!(error = %error, "login request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_error(error_html, &error.to_string())),
            )
                .into_response()
        }
    }
}

fn step_response(step: AuthStep) -> Response {
    match step {
        AuthStep::Redirect(redirect) => (
            StatusCode::FOUND,
            [(header::LOCATION, redirect.location().to_string())],
        )
            .into_response(),
        AuthStep::Url(url) => (StatusCode::OK, url).into_response(),
    }
}

fn render_error(template: &str, message: &str) -> String {
    template.replace("{{message}}", &escape_html(message))
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
