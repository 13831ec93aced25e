use thiserror::Error;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("no redirect uri configured and no inbound request to derive one from")]
    MissingRedirectUri,

    #[error("invalid redirect uri: {0}")]
    InvalidRedirectUri(String),

    #[error("invalid header: {name}={value}")]
    InvalidHeader { name: String, value: String },
}
