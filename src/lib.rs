//! Discord OAuth 2.0 authorization code login.
//!
//! [`OAuthSession::login`] drives the whole flow one request at a time: with
//! no credentials it builds the authorize redirect, with a `code` it exchanges
//! the code for an access token, and with a `token` it fetches the user's
//! `@me` profile.

mod config;
mod error;
mod inbound;
#[cfg(feature = "local-server")]
mod local_server;
mod providers;
mod request;
mod session;
mod transport;
mod types;

pub use config::SessionConfig;
pub use error::OAuthError;
pub use inbound::{InboundRequest, LoginParams};
#[cfg(feature = "local-server")]
pub use local_server::{LocalServer, LocalServerConfig};
pub use providers::{DiscordProvider, OAuthProvider};
pub use request::RequestIntent;
pub use session::OAuthSession;
pub use transport::{HttpMethod, HttpTransport, OutboundRequest, ReqwestTransport};
pub use types::{AuthStep, LoginOutcome, Redirect, TokenResponse, UserProfile};
