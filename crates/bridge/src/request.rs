use async_trait::async_trait;

/// Delivers a final text result back to whoever issued the command.
///
/// Delivery is fire-and-forget: implementations log their own failures.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn deliver(&self, text: String);
}

/// One command waiting for the dispatch worker. Consumed exactly once.
pub struct Request {
    /// Command name as typed, e.g. "/voucher".
    pub command: String,
    /// Requesting user, for logs only.
    pub user_id: Option<String>,
    pub reply: Box<dyn ReplySink>,
}

impl Request {
    pub fn new(command: impl Into<String>, reply: impl ReplySink + 'static) -> Self {
        Self {
            command: command.into(),
            user_id: None,
            reply: Box::new(reply),
        }
    }

    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("command", &self.command)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
