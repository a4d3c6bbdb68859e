use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    env_subst::substitute_env,
    schema::{BridgeConfig, RawConfig},
    validate::{ConfigError, Diagnostic, parse_bool, validate},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "vouchbot.toml",
    "vouchbot.yaml",
    "vouchbot.yml",
    "vouchbot.json",
];

/// Load and validate configuration from the process environment.
///
/// `path` forces a specific config file; otherwise standard locations are
/// searched and a missing file is not an error.
pub fn load(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    load_with(path, |name| std::env::var(name).ok())
}

/// Same as [`load`], reading variables through `lookup`.
pub fn load_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<BridgeConfig, ConfigError> {
    let mut diagnostics = Vec::new();

    let file = path.map(Path::to_path_buf).or_else(find_config_file);
    let mut raw = match file {
        Some(file) => {
            debug!(path = %file.display(), "loading config");
            match read_config(&file, &lookup) {
                Ok(raw) => raw,
                Err(message) => {
                    diagnostics.push(Diagnostic::new(file.display().to_string(), message));
                    RawConfig::default()
                },
            }
        },
        None => {
            debug!("no config file found, using environment only");
            RawConfig::default()
        },
    };

    apply_env_overrides(&mut raw, &lookup, &mut diagnostics);
    validate(raw, diagnostics)
}

/// Returns the user-global config directory (`~/.config/vouchbot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "vouchbot").map(|d| d.config_dir().to_path_buf())
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn read_config(path: &Path, lookup: &impl Fn(&str) -> Option<String>) -> Result<RawConfig, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("failed to read: {e}"))?;
    let raw = substitute_env(&raw, lookup);
    parse_config(&raw, path)
}

fn parse_config(raw: &str, path: &Path) -> Result<RawConfig, String> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| e.to_string()),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(raw).map_err(|e| e.to_string()),
        _ => Err(format!("unsupported config format: .{ext}")),
    }
}

/// Environment variables take precedence over file values.
fn apply_env_overrides(
    raw: &mut RawConfig,
    lookup: &impl Fn(&str) -> Option<String>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = var("UNIFI_BASE_URL") {
        raw.unifi.base_url = Some(v);
    }
    if let Some(v) = var("UNIFI_USER") {
        raw.unifi.user = Some(v);
    }
    if let Some(v) = var("UNIFI_PASSWORD") {
        raw.unifi.password = Some(v);
    }
    if let Some(v) = var("UNIFI_SSL_VERIFY") {
        match parse_bool(&v) {
            Some(b) => raw.unifi.ssl_verify = Some(b),
            None => diagnostics.push(Diagnostic::new(
                "unifi.ssl_verify",
                format!("UNIFI_SSL_VERIFY must be a boolean value, got \"{v}\""),
            )),
        }
    }
    if let Some(v) = var("UNIFI_TIMEOUT_SECS") {
        raw.unifi.timeout_secs =
            seconds(&v, "unifi.timeout_secs", "UNIFI_TIMEOUT_SECS", diagnostics);
    }
    if let Some(v) = var("SLACK_APP_TOKEN") {
        raw.slack.app_token = Some(v);
    }
    if let Some(v) = var("SLACK_BOT_TOKEN") {
        raw.slack.bot_token = Some(v);
    }
    if let Some(v) = var("SLACK_TIMEOUT_SECS") {
        raw.slack.timeout_secs =
            seconds(&v, "slack.timeout_secs", "SLACK_TIMEOUT_SECS", diagnostics);
    }
}

fn seconds(value: &str, path: &str, env: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<u64> {
    match value.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            diagnostics.push(Diagnostic::new(
                path,
                format!("{env} must be a whole number of seconds, got \"{value}\""),
            ));
            None
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret, std::collections::HashMap};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const FULL_ENV: &[(&str, &str)] = &[
        ("UNIFI_BASE_URL", "https://10.0.0.11"),
        ("UNIFI_USER", "admin"),
        ("UNIFI_PASSWORD", "secret"),
        ("SLACK_APP_TOKEN", "xapp-1-abc"),
        ("SLACK_BOT_TOKEN", "xoxb-123"),
    ];

    fn empty_config_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("vouchbot.toml");
        std::fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn loads_from_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = empty_config_file(&dir);
        let cfg = load_with(Some(&path), env(FULL_ENV)).unwrap();
        assert_eq!(cfg.unifi.username, "admin");
        assert_eq!(cfg.slack.bot_token.expose_secret(), "xoxb-123");
        assert!(cfg.unifi.verify_tls);
    }

    #[test]
    fn environment_overrides_file_and_substitutes_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vouchbot.toml");
        std::fs::write(
            &path,
            r#"
            [unifi]
            base_url = "https://controller.local"
            user = "file-user"
            password = "${VOUCHBOT_PW}"
            timeout_secs = 5

            [slack]
            app_token = "xapp-file"
            bot_token = "xoxb-file"
            "#,
        )
        .unwrap();

        let cfg = load_with(
            Some(&path),
            env(&[("UNIFI_USER", "env-user"), ("VOUCHBOT_PW", "from-env")]),
        )
        .unwrap();
        assert_eq!(cfg.unifi.username, "env-user");
        assert_eq!(cfg.unifi.password.expose_secret(), "from-env");
        assert_eq!(cfg.unifi.base_url.as_str(), "https://controller.local/");
        assert_eq!(cfg.unifi.timeout.as_secs(), 5);
        assert_eq!(cfg.slack.app_token.expose_secret(), "xapp-file");
    }

    #[test]
    fn bad_ssl_verify_is_collected_with_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = empty_config_file(&dir);
        let err = load_with(
            Some(&path),
            env(&[("UNIFI_SSL_VERIFY", "sometimes"), ("UNIFI_USER", "admin")]),
        )
        .unwrap_err();
        let paths: Vec<_> = err.diagnostics().iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec![
            "unifi.ssl_verify",
            "unifi.base_url",
            "unifi.password",
            "slack.app_token",
            "slack.bot_token",
        ]);
    }

    #[test]
    fn ssl_verify_false_from_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = empty_config_file(&dir);
        let mut vars = FULL_ENV.to_vec();
        vars.push(("UNIFI_SSL_VERIFY", "false"));
        let cfg = load_with(Some(&path), env(&vars)).unwrap();
        assert!(!cfg.unifi.verify_tls);
    }

    #[test]
    fn slack_timeout_from_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = empty_config_file(&dir);
        let mut vars = FULL_ENV.to_vec();
        vars.push(("SLACK_TIMEOUT_SECS", "7"));
        let cfg = load_with(Some(&path), env(&vars)).unwrap();
        assert_eq!(cfg.slack.timeout.as_secs(), 7);

        vars.push(("UNIFI_TIMEOUT_SECS", "soon"));
        let err = load_with(Some(&path), env(&vars)).unwrap_err();
        assert_eq!(err.diagnostics()[0].path, "unifi.timeout_secs");
        assert!(err.diagnostics()[0].message.starts_with("UNIFI_TIMEOUT_SECS"));
    }

    #[test]
    fn unreadable_file_is_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = load_with(Some(&path), env(FULL_ENV)).unwrap_err();
        assert_eq!(err.diagnostics().len(), 1);
        assert!(err.diagnostics()[0].message.contains("failed to read"));
    }

    #[test]
    fn yaml_config_is_supported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vouchbot.yaml");
        std::fs::write(&path, "unifi:\n  ssl_verify: false\n").unwrap();
        let cfg = load_with(Some(&path), env(FULL_ENV)).unwrap();
        assert!(!cfg.unifi.verify_tls);
    }
}
