use std::future::Future;
use std::net::TcpListener;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener as TokioTcpListener;

use crate::{HttpTransport, OAuthError, OAuthProvider, ReqwestTransport, SessionConfig};

use super::config::LocalServerConfig;
use super::http::{LocalServerState, fallback_handler, login_handler};

/// Serves [`OAuthSession::login`](crate::OAuthSession::login) on the configured
/// callback path.
#[derive(Debug, Clone)]
pub struct LocalServer<P, T = ReqwestTransport> {
    provider: P,
    session_config: SessionConfig,
    transport: T,
    config: LocalServerConfig,
}

impl<P> LocalServer<P, ReqwestTransport>
where
    P: OAuthProvider + Clone + 'static,
{
    pub fn new(
        provider: P,
        session_config: SessionConfig,
        config: LocalServerConfig,
    ) -> Result<Self, OAuthError> {
        let transport = ReqwestTransport::new(session_config.force_ipv4, session_config.timeout)?;
        Ok(Self::with_transport(
            provider,
            session_config,
            config,
            transport,
        ))
    }
}

impl<P, T> LocalServer<P, T>
where
    P: OAuthProvider + Clone + 'static,
    T: HttpTransport + Clone + 'static,
{
    pub fn with_transport(
        provider: P,
        session_config: SessionConfig,
        config: LocalServerConfig,
        transport: T,
    ) -> Self {
        Self {
            provider,
            session_config,
            transport,
            config,
        }
    }

    pub fn config(&self) -> &LocalServerConfig {
        &self.config
    }

    /// URL that starts the login flow in a browser.
    pub fn login_url(&self) -> String {
        self.config.redirect_uri()
    }

    pub fn router(&self) -> Router {
        let state = LocalServerState {
            provider: self.provider.clone(),
            session_config: Arc::new(self.session_config.clone()),
            transport: self.transport.clone(),
            fallback_host: format!("{}:{}", self.config.host, self.config.port),
            error_html: Arc::from(self.config.error_html.as_str()),
        };

        Router::new()
            .route(&self.config.path, get(login_handler::<P, T>))
            .fallback(fallback_handler::<P, T>)
            .with_state(state)
    }

    pub fn bind(&self) -> Result<TcpListener, OAuthError> {
        TcpListener::bind((self.config.host.as_str(), self.config.port)).map_err(OAuthError::from)
    }

    pub async fn serve_with_shutdown<F>(
        &self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), OAuthError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        listener.set_nonblocking(true)?;
        let listener = TokioTcpListener::from_std(listener)?;
        tracing::info!(
            address = %listener.local_addr()?,
            path = %self.config.path,
            "local login server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("local login server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::{StatusCode, header::LOCATION, redirect::Policy};
    use tokio::sync::oneshot;

    use super::LocalServer;
    use crate::{DiscordProvider, LocalServerConfig, SessionConfig};

    async fn spawn_server(
        provider: DiscordProvider,
        session_config: SessionConfig,
    ) -> (String, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = LocalServer::new(
            provider,
            session_config,
            LocalServerConfig::new("127.0.0.1", port, "/callback"),
        )
        .unwrap();
        let login_url = server.login_url();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            server
                .serve_with_shutdown(listener, async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });
        (login_url, shutdown_tx)
    }

    fn browser() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn walks_the_login_flow() {
        let mut discord = mockito::Server::new_async().await;
        let token = discord
            .mock("POST", "/oauth2/token")
            .with_body(r#"{"access_token":"T1","token_type":"Bearer"}"#)
            .create_async()
            .await;
        let me = discord
            .mock("GET", "/users/@me")
            .match_header("authorization", "Bearer T1")
            .with_body(r#"{"id":"1","username":"u"}"#)
            .create_async()
            .await;

        let provider = DiscordProvider::with_api_base(discord.url());
        let session_config = SessionConfig::new()
            .with_client_id("client-id")
            .with_client_secret("client-secret");
        let (login_url, shutdown) = spawn_server(provider, session_config).await;
        let browser = browser();

        let response = browser.get(&login_url).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[LOCATION].to_str().unwrap().to_string();
        assert!(location.starts_with(&format!("{}/oauth2/authorize?", discord.url())));
        assert!(location.contains("client_id=client-id"));

        let response = browser
            .get(format!("{login_url}?code=abc"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[LOCATION].to_str().unwrap(),
            format!("{login_url}?token=T1")
        );

        let response = browser
            .get(format!("{login_url}?token=T1"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let profile: serde_json::Value = response.json().await.unwrap();
        assert_eq!(profile["username"], "u");

        token.assert_async().await;
        me.assert_async().await;
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn failed_exchange_shows_error_page() {
        let mut discord = mockito::Server::new_async().await;
        discord
            .mock("POST", "/oauth2/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let provider = DiscordProvider::with_api_base(discord.url());
        let (login_url, shutdown) = spawn_server(provider, SessionConfig::new()).await;

        let response = browser()
            .get(format!("{login_url}?code=bad"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = response.text().await.unwrap();
        assert!(body.contains("No access token was found in token exchange."));

        let response = browser()
            .get(login_url.replace("/callback", "/elsewhere"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let _ = shutdown.send(());
    }
}
