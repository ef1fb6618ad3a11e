//! HTTP seam between the adapter and the server.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::errors::TransportError;

/// One JSON request/response exchange. Implementations never retry.
///
/// Non-2xx statuses are not failures at this level: the server reports
/// exceptions in the body, and callers classify them from there.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, uri: &str) -> Result<Value, TransportError>;

    async fn post_json(&self, uri: &str, body: &Value) -> Result<Value, TransportError>;
}

/// `Transport` over a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, uri: &str) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(uri)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        read_json(uri, response).await
    }

    async fn post_json(&self, uri: &str, body: &Value) -> Result<Value, TransportError> {
        let response = self
            .client
            .post(uri)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;
        read_json(uri, response).await
    }
}

async fn read_json(uri: &str, response: reqwest::Response) -> Result<Value, TransportError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        log::debug!("{} answered {}", uri, status);
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text).map_err(|e| TransportError::InvalidBody {
        uri: uri.to_string(),
        message: format!("{} (status {})", e, status),
    })
}
