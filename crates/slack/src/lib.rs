//! Slack Socket Mode transport.
//!
//! [`socket::SocketListener`] runs slack-morphism's socket mode listener and
//! forwards acknowledged envelopes as [`events::SocketEvent`]s;
//! [`handler::EventHandler`] turns slash commands into dispatch requests
//! whose replies are posted back through the command's `response_url`.

pub mod error;
pub mod events;
pub mod handler;
pub mod reply;
pub mod socket;

pub use {
    error::{Error, Result},
    events::SocketEvent,
    handler::EventHandler,
    reply::{ResponseUrlReply, reply_client},
    socket::SocketListener,
};
