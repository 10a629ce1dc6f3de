use async_trait::async_trait;
use log::debug;
use url::Url;

use super::ClientError;
use crate::models::relay::{ RelayRequest, RelayResponseBody, ARCHIVE_FAILED };

#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// One POST to the relay; resolves to the reply text.
    async fn post_message(&self, request: &RelayRequest) -> Result<String, ClientError>;
}

pub struct HttpRelayClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpRelayClient {
    pub fn new(relay_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: message_endpoint(relay_url)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// `{relay_url}/api/message`, keeping any path prefix on the relay URL.
pub fn message_endpoint(relay_url: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(relay_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("api/message")
}

#[async_trait]
impl RelayTransport for HttpRelayClient {
    async fn post_message(&self, request: &RelayRequest) -> Result<String, ClientError> {
        debug!(
            "POST {} (history={} turns)",
            self.endpoint,
            request.history.len()
        );
        let response = self.http.post(self.endpoint.clone()).json(request).send().await?;
        let status = response.status();
        let body: RelayResponseBody = response.json().await?;

        if !status.is_success() {
            let message = body.error_message().unwrap_or_else(|| ARCHIVE_FAILED.to_string());
            return Err(ClientError::Server(message));
        }
        Ok(body.reply_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::{ HistoryEntry, Role };
    use crate::test_support::{ relay_app, MockChatClient };
    use std::sync::Arc;

    async fn spawn_relay(client: Arc<MockChatClient>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, relay_app(client).into_make_service()).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn endpoint_keeps_prefix() {
        assert_eq!(message_endpoint("http://localhost:3000").unwrap().as_str(), "http://localhost:3000/api/message");
        assert_eq!(
            message_endpoint("https://books.example/libris").unwrap().as_str(),
            "https://books.example/libris/api/message"
        );
        assert!(message_endpoint("not a url").is_err());
    }

    #[tokio::test]
    async fn posts_to_relay_and_reads_text() {
        let mock = MockChatClient::replying("The ending suggests ambiguity.");
        let url = spawn_relay(mock.clone()).await;
        let client = HttpRelayClient::new(&url).unwrap();

        let request = RelayRequest {
            message: "Discuss the ending".into(),
            history: vec![HistoryEntry { role: Role::User, text: "hi".into() }],
        };
        let text = client.post_message(&request).await.unwrap();

        assert_eq!(text, "The ending suggests ambiguity.");
        assert_eq!(mock.calls()[0].contents.len(), 2);
    }

    #[tokio::test]
    async fn relay_error_body_becomes_server_error() {
        let url = spawn_relay(MockChatClient::failing("boom")).await;
        let client = HttpRelayClient::new(&url).unwrap();

        let err = client
            .post_message(&RelayRequest { message: "hi".into(), history: vec![] }).await
            .unwrap_err();

        assert!(matches!(&err, ClientError::Server(m) if m == "The archive failed to respond."));
        assert_eq!(err.banner(), "The archive failed to respond.");
    }

    #[tokio::test]
    async fn unreachable_relay_is_network_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = HttpRelayClient::new(&format!("http://{}", addr)).unwrap();

        let err = client
            .post_message(&RelayRequest { message: "hi".into(), history: vec![] }).await
            .unwrap_err();

        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(err.banner(), "The archive failed to respond.");
    }
}
