use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The Slack HTTP connector could not be built (TLS roots, runtime).
    #[error("slack connector setup failed: {0}")]
    Connector(String),

    /// Slack rejected a Web API call or the socket could not be opened.
    #[error("slack client error: {0}")]
    Client(#[from] slack_morphism::errors::SlackClientError),
}

pub type Result<T> = std::result::Result<T, Error>;
