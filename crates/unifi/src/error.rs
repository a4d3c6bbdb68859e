use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Login rejected or the login request could not be completed.
    #[error("unifi authentication failed: {message}")]
    Auth { message: String },

    #[error("unifi request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unifi voucher failed with status code {status}")]
    Backend { status: u16 },

    #[error("unifi voucher response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid unifi endpoint: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
