//! HTTP client posting chat cards to the webhook.

use std::time::Duration;

use reqwest::Client;
use tracing::info;
use url::Url;

use crate::error::NotifyError;
use crate::notify::card::ChatMessage;

/// Posts chat messages to a single webhook URL.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    webhook_url: Url,
    timeout: Duration,
}

impl Notifier {
    pub fn new(client: Client, webhook_url: Url, timeout: Duration) -> Self {
        Self {
            client,
            webhook_url,
            timeout,
        }
    }

    /// Post one message. Any non-2xx response is an error.
    pub async fn send(&self, message: &ChatMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.webhook_url.clone())
            .timeout(self.timeout)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            host = self.webhook_url.host_str().unwrap_or_default(),
            status_code = status.as_u16(),
            "chat_notification_sent"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{BuildPayload, EventType};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> ChatMessage {
        let payload = BuildPayload {
            number: "1".to_string(),
            event_type: EventType::Push,
            state: "passed".to_string(),
            branch: "main".to_string(),
            ..BuildPayload::default()
        };
        ChatMessage::for_build(&payload, "org/repo", "img")
    }

    fn notifier_for(server: &MockServer) -> Notifier {
        let url = Url::parse(&format!("{}/chat", server.uri())).unwrap();
        Notifier::new(Client::new(), url, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_send_posts_json_card() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "cards": [{"header": {"title": "Travis CI", "subtitle": "org/repo@main"}}]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        notifier_for(&server).send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_reports_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad card"))
            .mount(&server)
            .await;

        let err = notifier_for(&server).send(&message()).await.unwrap_err();
        match err {
            NotifyError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad card");
            }
            other => panic!("Expected status error, got {other:?}"),
        }
    }
}
