//! Orchestration between the chat transport and the voucher backend.
//!
//! Commands become [`Request`]s on a single-consumer queue
//! ([`dispatch`]); one worker serves them in order. The [`lifecycle`]
//! coordinator runs every long-lived unit under one cancellation token.

pub mod dispatch;
pub mod lifecycle;
pub mod request;

pub use {
    dispatch::{CodeSource, DispatchClosed, DispatchHandle, Dispatcher},
    lifecycle::{Lifecycle, UnitExit},
    request::{ReplySink, Request},
};
