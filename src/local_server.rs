mod config;
mod http;
mod server;

pub use config::LocalServerConfig;
pub use server::LocalServer;
