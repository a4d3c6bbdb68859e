//! Socket event loop: turns slash commands into dispatch requests.

use {
    slack_morphism::prelude::*,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use vouchbot_bridge::{DispatchHandle, Request};

use crate::{events::SocketEvent, reply::ResponseUrlReply};

pub struct EventHandler {
    dispatch: DispatchHandle,
    http: reqwest::Client,
}

/// Whether the loop keeps going after an event.
enum Flow {
    Continue,
    Stop,
}

impl EventHandler {
    /// `http` carries the reply timeout; see [`reply_client`](crate::reply::reply_client).
    pub fn new(dispatch: DispatchHandle, http: reqwest::Client) -> Self {
        Self { dispatch, http }
    }

    /// Consume events until `disconnect`, stream end, or cancellation.
    pub async fn run(
        self,
        mut events: mpsc::UnboundedReceiver<SocketEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => {
                        info!("socket event stream closed");
                        return;
                    },
                },
            };
            if let Flow::Stop = self.handle(event) {
                return;
            }
        }
    }

    fn handle(&self, event: SocketEvent) -> Flow {
        match event {
            SocketEvent::Connected { bot_user_id } => {
                info!(bot_user_id = %bot_user_id, "slack socket mode connected");
            },
            SocketEvent::SlashCommand(command) => self.submit(command),
            SocketEvent::Push(callback) => {
                debug!(event_id = ?callback.event_id, "events api callback");
            },
            SocketEvent::Interaction(_) => warn!("interactive events are not handled"),
            SocketEvent::Disconnect { reason } => {
                info!(reason = %reason, "slack disconnected");
                return Flow::Stop;
            },
        }
        Flow::Continue
    }

    fn submit(&self, command: SlackCommandEvent) {
        info!(
            command = %command.command,
            user_id = %command.user_id,
            channel_id = %command.channel_id,
            "slash command received"
        );
        let reply = ResponseUrlReply::new(self.http.clone(), command.response_url.0);
        let request =
            Request::new(command.command.to_string(), reply).with_user(command.user_id.to_string());
        if let Err(e) = self.dispatch.submit(request) {
            warn!(error = %e, command = %e.0.command, "request dropped");
        }
    }
}
