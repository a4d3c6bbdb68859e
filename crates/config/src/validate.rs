//! Configuration validation.
//!
//! Every problem is collected as a [`Diagnostic`] so that a single startup
//! failure reports all missing or malformed settings at once.

use std::time::Duration;

use {secrecy::Secret, url::Url};

use crate::schema::{
    APP_TOKEN_PREFIX, BOT_TOKEN_PREFIX, BridgeConfig, DEFAULT_TIMEOUT_SECS, RawConfig,
    SlackConfig, UnifiConfig,
};

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Dotted path, e.g. "unifi.base_url"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {} problem(s) found", .0.len())]
    Invalid(Vec<Diagnostic>),
}

impl ConfigError {
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Invalid(diagnostics) => diagnostics,
        }
    }
}

/// Validate the merged raw config, appending to `diagnostics` collected by
/// earlier stages (file parsing, environment overrides).
pub fn validate(
    raw: RawConfig,
    mut diagnostics: Vec<Diagnostic>,
) -> Result<BridgeConfig, ConfigError> {
    let base_url = match non_empty(raw.unifi.base_url) {
        None => {
            diagnostics.push(Diagnostic::new(
                "unifi.base_url",
                "not set (UNIFI_BASE_URL)",
            ));
            None
        },
        Some(value) => match Url::parse(&value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
            Ok(url) => {
                diagnostics.push(Diagnostic::new(
                    "unifi.base_url",
                    format!("unsupported scheme \"{}\"", url.scheme()),
                ));
                None
            },
            Err(e) => {
                diagnostics.push(Diagnostic::new(
                    "unifi.base_url",
                    format!("invalid URL \"{value}\": {e}"),
                ));
                None
            },
        },
    };

    let username = required(raw.unifi.user, "unifi.user", "UNIFI_USER", &mut diagnostics);
    let password = required(
        raw.unifi.password,
        "unifi.password",
        "UNIFI_PASSWORD",
        &mut diagnostics,
    );

    let app_token = token(
        raw.slack.app_token,
        "slack.app_token",
        "SLACK_APP_TOKEN",
        APP_TOKEN_PREFIX,
        &mut diagnostics,
    );
    let bot_token = token(
        raw.slack.bot_token,
        "slack.bot_token",
        "SLACK_BOT_TOKEN",
        BOT_TOKEN_PREFIX,
        &mut diagnostics,
    );

    let unifi_timeout = timeout(raw.unifi.timeout_secs, "unifi.timeout_secs", &mut diagnostics);
    let slack_timeout = timeout(raw.slack.timeout_secs, "slack.timeout_secs", &mut diagnostics);

    match (base_url, username, password, app_token, bot_token) {
        (Some(base_url), Some(username), Some(password), Some(app_token), Some(bot_token))
            if diagnostics.is_empty() =>
        {
            Ok(BridgeConfig {
                unifi: UnifiConfig {
                    base_url,
                    username,
                    password: Secret::new(password),
                    verify_tls: raw.unifi.ssl_verify.unwrap_or(true),
                    timeout: unifi_timeout,
                },
                slack: SlackConfig {
                    app_token: Secret::new(app_token),
                    bot_token: Secret::new(bot_token),
                    timeout: slack_timeout,
                },
            })
        },
        _ => Err(ConfigError::Invalid(diagnostics)),
    }
}

fn timeout(secs: Option<u64>, path: &str, diagnostics: &mut Vec<Diagnostic>) -> Duration {
    let secs = secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if secs == 0 {
        diagnostics.push(Diagnostic::new(path, "must be greater than zero"));
    }
    Duration::from_secs(secs)
}

/// Parse a boolean the way operators write it in environment files.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" | "yes" | "on" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(
    value: Option<String>,
    path: &str,
    env: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let value = non_empty(value);
    if value.is_none() {
        diagnostics.push(Diagnostic::new(path, format!("not set ({env})")));
    }
    value
}

fn token(
    value: Option<String>,
    path: &str,
    env: &str,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let value = required(value, path, env, diagnostics)?;
    if !value.starts_with(prefix) {
        diagnostics.push(Diagnostic::new(
            path,
            format!("must have the prefix \"{prefix}\""),
        ));
        return None;
    }
    Some(value)
}
