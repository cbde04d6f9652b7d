use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level config (bifrost.toml + BIFROST_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BifrostConfig {
    /// Bridge topology as `"slack-channel:irc-channel"` pair strings.
    pub bridges: Vec<String>,
    /// Path to the emoji shortcode table (emoji-data JSON dump).
    #[serde(default = "default_emoji_file")]
    pub emoji_file: String,
    pub irc: IrcConfig,
    pub slack: SlackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrcConfig {
    /// Server hostname, e.g. "irc.libera.chat".
    pub server: String,
    #[serde(default = "default_irc_port")]
    pub port: u16,
    #[serde(default = "bool_true")]
    pub use_tls: bool,
    pub nick: String,
    #[serde(default = "default_realname")]
    pub realname: String,
    /// Server password (rarely needed on public networks).
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot token (xoxb-…) for the Web API.
    pub bot_token: String,
    /// App-level token (xapp-…) for Socket Mode.
    pub app_token: String,
}

fn bool_true() -> bool {
    true
}
fn default_irc_port() -> u16 {
    6697
}
fn default_realname() -> String {
    "bifrost relay".to_string()
}
fn default_emoji_file() -> String {
    "emoji_pretty.json".to_string()
}

impl BifrostConfig {
    /// Load config from a TOML file with BIFROST_* env var overrides.
    ///
    /// Missing credentials or bridge pairs fail here, before any connection
    /// is attempted.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("bifrost.toml");

        let config: BifrostConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("BIFROST_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}
