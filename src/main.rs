use std::path::PathBuf;

use clap::Parser;
use discord_login::{DiscordProvider, LocalServer, LocalServerConfig, OAuthError, SessionConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "discord-login",
    about = "Run a local Discord OAuth login server that answers with the authenticated profile."
)]
struct Cli {
    /// Discord application client id.
    #[arg(long, env = "DISCORD_CLIENT_ID")]
    client_id: Option<String>,

    /// Discord application client secret.
    #[arg(long, env = "DISCORD_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// JSON session config (camelCase keys). Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8765)]
    port: u16,

    #[arg(long, default_value = "/callback")]
    path: String,

    /// Do not open the login page in a browser.
    #[arg(long)]
    no_browser: bool,
}

#[tokio::main]
async fn main() -> Result<(), OAuthError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let server_config = LocalServerConfig::new(cli.host, cli.port, cli.path);
    let session_config = load_session_config(
        cli.config.as_deref(),
        cli.client_id,
        cli.client_secret,
        &server_config,
    )?;

    let server = LocalServer::new(DiscordProvider::new(), session_config, server_config)?;
    let listener = server.bind()?;
    let login_url = server.login_url();

    eprintln!("Login URL:\n{login_url}");
    if !cli.no_browser {
        if let Err(err) = webbrowser::open(&login_url) {
            eprintln!("Failed to open browser automatically: {err}");
        }
    }

    server
        .serve_with_shutdown(listener, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for ctrl-c");
            }
        })
        .await
}

fn load_session_config(
    path: Option<&std::path::Path>,
    client_id: Option<String>,
    client_secret: Option<String>,
    server_config: &LocalServerConfig,
) -> Result<SessionConfig, OAuthError> {
    let mut config = match path {
        Some(path) => SessionConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => SessionConfig::new(),
    };

    if let Some(client_id) = client_id {
        config = config.with_client_id(client_id);
    }
    if let Some(client_secret) = client_secret {
        config = config.with_client_secret(client_secret);
    }
    if config.redirect_uri.is_none() {
        config = config.with_redirect_uri(server_config.redirect_uri());
    }
    if config.client_id.is_none() {
        return Err(OAuthError::Config(
            "a client id is required (--client-id or DISCORD_CLIENT_ID)".to_string(),
        ));
    }
    Ok(config)
}
