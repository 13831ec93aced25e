mod discord;
mod provider;

pub use discord::DiscordProvider;
pub use provider::OAuthProvider;
