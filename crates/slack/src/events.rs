//! What the socket listener hands to the event handler.

use slack_morphism::prelude::*;

/// Transport events, in arrival order.
#[derive(Debug)]
pub enum SocketEvent {
    /// Socket Mode listener running; Slack may start delivering envelopes.
    Connected { bot_user_id: String },
    /// Slash command; the listener callback acks it after forwarding.
    SlashCommand(SlackCommandEvent),
    /// Events API callback.
    Push(SlackPushEventCallback),
    /// Block action, shortcut or view submission.
    Interaction(SlackInteractionEvent),
    /// The listener stopped; no further events follow.
    Disconnect { reason: String },
}
