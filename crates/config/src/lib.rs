//! Configuration loading and validation.
//!
//! Config files: `vouchbot.toml`, `vouchbot.yaml` or `vouchbot.json`,
//! searched in `./` then `~/.config/vouchbot/`. Environment variables
//! (`UNIFI_*`, `SLACK_*`) override file values.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, load, load_with},
    schema::{BridgeConfig, RawConfig, SlackConfig, UnifiConfig},
    validate::{ConfigError, Diagnostic},
};
