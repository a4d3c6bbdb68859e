use {async_trait::async_trait, tracing::warn, url::Url};

use {vouchbot_bridge::ReplySink, vouchbot_config::SlackConfig};

/// HTTP client for `response_url` replies. Every request is bounded by the
/// configured timeout, so a stalled reply cannot hold up the dispatch queue.
pub fn reply_client(config: &SlackConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(config.timeout).build()
}

/// Posts a dispatch result to a slash command's `response_url`.
pub struct ResponseUrlReply {
    http: reqwest::Client,
    response_url: Url,
}

impl ResponseUrlReply {
    pub fn new(http: reqwest::Client, response_url: Url) -> Self {
        Self { http, response_url }
    }
}

/// Ephemeral message with the text in a code block.
pub fn render_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "response_type": "ephemeral",
        "text": text,
        "blocks": [{
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("```\n{text}```"),
            },
        }],
    })
}

#[async_trait]
impl ReplySink for ResponseUrlReply {
    async fn deliver(&self, text: String) {
        let body = render_reply(&text);
        match self
            .http
            .post(self.response_url.clone())
            .json(&body)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {},
            Ok(resp) => warn!(status = resp.status().as_u16(), "slack rejected reply"),
            Err(e) => warn!(error = %e, "failed to post reply"),
        }
    }
}
