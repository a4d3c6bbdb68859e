use std::path::Path;

use {anyhow::Result, clap::Subcommand};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration and report every problem found.
    Check,
    /// Print where the configuration file is searched for.
    Path,
}

pub fn handle_config(action: ConfigAction, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check => check(path),
        ConfigAction::Path => {
            println!("./vouchbot.{{toml,yaml,yml,json}}");
            if let Some(dir) = vouchbot_config::config_dir() {
                println!("{}/vouchbot.{{toml,yaml,yml,json}}", dir.display());
            }
            Ok(())
        },
    }
}

fn check(path: Option<&Path>) -> Result<()> {
    match vouchbot_config::load(path) {
        Ok(config) => {
            eprintln!("No issues found.");
            eprintln!("  unifi: {}", config.unifi.base_url);
            eprintln!("  slack reply timeout: {:?}", config.slack.timeout);
            Ok(())
        },
        Err(e) => {
            for d in e.diagnostics() {
                eprintln!("  error {d}");
            }
            eprintln!();
            anyhow::bail!(e)
        },
    }
}
