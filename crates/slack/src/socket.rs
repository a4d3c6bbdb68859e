//! Socket Mode connection process.
//!
//! Uses slack-morphism's socket mode listener, which keeps the WebSocket
//! alive and reconnects on its own. Callbacks acknowledge envelopes and
//! forward the typed events to the [`EventHandler`](crate::EventHandler).

use std::sync::Arc;

use {
    secrecy::{ExposeSecret, Secret},
    slack_morphism::prelude::*,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info},
};

use vouchbot_config::SlackConfig;

use crate::{
    error::{Error, Result},
    events::SocketEvent,
};

type CallbackResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Shared state for socket mode callbacks.
struct ListenerState {
    events: mpsc::UnboundedSender<SocketEvent>,
}

pub struct SocketListener {
    app_token: Secret<String>,
    bot_token: Secret<String>,
    events: mpsc::UnboundedSender<SocketEvent>,
}

impl SocketListener {
    pub fn new(config: &SlackConfig, events: mpsc::UnboundedSender<SocketEvent>) -> Self {
        Self {
            app_token: config.app_token.clone(),
            bot_token: config.bot_token.clone(),
            events,
        }
    }

    /// Authenticate the bot, listen until `cancel` fires, then shut the
    /// listener down.
    ///
    /// Returns an error when Slack rejects a token or the socket cannot be
    /// opened; a [`SocketEvent::Disconnect`] is emitted on every exit.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let result = self.listen(&cancel).await;
        let reason = match &result {
            Ok(()) => "shutdown".to_string(),
            Err(e) => e.to_string(),
        };
        // Receiver gone means the handler has exited already.
        let _ = self.events.send(SocketEvent::Disconnect { reason });
        result
    }

    async fn listen(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let connector =
            SlackClientHyperConnector::new().map_err(|e| Error::Connector(e.to_string()))?;
        let client = Arc::new(SlackClient::new(connector));

        let token = SlackApiToken::new(self.bot_token.expose_secret().clone().into());
        let session = client.open_session(&token);
        let auth_test = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            auth_test = session.auth_test() => auth_test?,
        };
        let bot_user_id = auth_test.user_id.to_string();
        info!(
            bot_user = ?auth_test.user,
            bot_user_id = %bot_user_id,
            "slack bot authenticated"
        );

        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_command_events(handle_command_events)
            .with_push_events(handle_push_events)
            .with_interaction_events(handle_interaction_events);

        let listener_env = Arc::new(
            SlackClientEventsListenerEnvironment::new(Arc::clone(&client)).with_user_state(
                ListenerState {
                    events: self.events.clone(),
                },
            ),
        );

        let socket_listener = SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_env,
            callbacks,
        );

        let app_token = SlackApiToken::new(self.app_token.expose_secret().clone().into());
        tokio::select! {
            result = socket_listener.listen_for(&app_token) => result?,
            _ = cancel.cancelled() => {
                socket_listener.shutdown().await;
                return Ok(());
            },
        }
        let _ = self.events.send(SocketEvent::Connected { bot_user_id });

        cancel.cancelled().await;
        info!("socket mode cancelled");
        socket_listener.shutdown().await;
        Ok(())
    }
}

async fn forward(states: &SlackClientEventsUserState, event: SocketEvent) -> CallbackResult<()> {
    let guard = states.read().await;
    let state = guard
        .get_user_state::<ListenerState>()
        .ok_or("missing socket mode state")?;
    state
        .events
        .send(event)
        .map_err(|_| "event handler gone")?;
    Ok(())
}

/// Handle slash commands. Returning the empty response is the ack; the
/// actual reply goes to the command's `response_url` later.
async fn handle_command_events(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> CallbackResult<SlackCommandEventResponse> {
    debug!(command = %event.command, "received slash command");
    forward(&states, SocketEvent::SlashCommand(event)).await?;
    Ok(SlackCommandEventResponse::new(SlackMessageContent::new()))
}

async fn handle_push_events(
    event: SlackPushEventCallback,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> CallbackResult<()> {
    forward(&states, SocketEvent::Push(event)).await
}

async fn handle_interaction_events(
    event: SlackInteractionEvent,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> CallbackResult<()> {
    forward(&states, SocketEvent::Interaction(event)).await
}
