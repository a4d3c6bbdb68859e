mod config_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    vouchbot_bridge::{Lifecycle, dispatch},
    vouchbot_config::BridgeConfig,
    vouchbot_slack::{EventHandler, SocketListener, reply_client},
    vouchbot_unifi::{SessionClient, VoucherService},
};

#[derive(Parser)]
#[command(name = "vouchbot", about = "Slack bot for UniFi guest vouchers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: search ./ then ~/.config/vouchbot/).
    #[arg(long, global = true, env = "VOUCHBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Slack and serve voucher requests (default).
    Run,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Wire every unit and block until they have all stopped.
async fn serve(config: BridgeConfig) -> anyhow::Result<()> {
    let session = SessionClient::new(&config.unifi)?;
    let (dispatch_handle, dispatcher) = dispatch::channel(VoucherService::new(session));

    let (event_tx, events) = tokio::sync::mpsc::unbounded_channel();
    let listener = SocketListener::new(&config.slack, event_tx);
    let handler = EventHandler::new(dispatch_handle, reply_client(&config.slack)?);

    let mut lifecycle = Lifecycle::new();
    lifecycle.watch_signals();
    lifecycle.spawn("dispatch", dispatcher.run(lifecycle.token()));
    lifecycle.spawn("events", handler.run(events, lifecycle.token()));
    lifecycle.spawn("socket", listener.run(lifecycle.token()));
    lifecycle.wait().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    match cli.command {
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, cli.config.as_deref())
        },
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "vouchbot starting");
            let config = match vouchbot_config::load(cli.config.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    for d in e.diagnostics() {
                        error!(path = %d.path, "{}", d.message);
                    }
                    return Err(e.into());
                },
            };
            info!(unifi = %config.unifi.base_url, "configuration loaded");
            serve(config).await?;
            info!("vouchbot stopped");
            Ok(())
        },
    }
}
