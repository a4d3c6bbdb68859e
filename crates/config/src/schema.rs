//! Config schema: the raw layer read from file and environment, and the
//! validated values handed to each component.

use std::time::Duration;

use {
    secrecy::Secret,
    serde::{Deserialize, Serialize},
    url::Url,
};

/// Default timeout for every outbound HTTP request (UniFi and Slack replies).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Required prefix of a Slack app-level token (Socket Mode).
pub const APP_TOKEN_PREFIX: &str = "xapp-";

/// Required prefix of a Slack bot token.
pub const BOT_TOKEN_PREFIX: &str = "xoxb-";

/// Unvalidated configuration as read from a file, before environment
/// overrides are applied. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub unifi: RawUnifiConfig,
    pub slack: RawSlackConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawUnifiConfig {
    pub base_url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub ssl_verify: Option<bool>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSlackConfig {
    pub app_token: Option<String>,
    pub bot_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully validated configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub unifi: UnifiConfig,
    pub slack: SlackConfig,
}

/// Connection settings for the UniFi controller.
#[derive(Clone)]
pub struct UnifiConfig {
    /// Controller base address; any path prefix is preserved.
    pub base_url: Url,
    pub username: String,
    pub password: Secret<String>,
    /// Verify the controller's TLS certificate. Only disabled when
    /// explicitly configured.
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl std::fmt::Debug for UnifiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnifiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Slack Socket Mode credentials.
#[derive(Clone)]
pub struct SlackConfig {
    /// App-level token (`xapp-…`) used to open Socket Mode connections.
    pub app_token: Secret<String>,
    /// Bot token (`xoxb-…`) used for Web API calls.
    pub bot_token: Secret<String>,
    /// Bound on each reply posted to a command's `response_url`.
    pub timeout: Duration,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("app_token", &"[REDACTED]")
            .field("bot_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}
