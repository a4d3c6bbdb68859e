//! UniFi controller client for guest access vouchers.
//!
//! [`SessionClient`] owns the cookie-backed HTTP session and re-authenticates
//! lazily; [`VoucherService`] turns a fetch into the text reply sent back to
//! chat.

pub mod error;
pub mod service;
pub mod session;
pub mod voucher;

pub use {
    error::{Error, Result},
    service::{MAX_CODES, NO_VOUCHERS, VoucherService, format_reply},
    session::{SessionClient, SessionState},
    voucher::{AccessCode, VoucherEnvelope},
};
