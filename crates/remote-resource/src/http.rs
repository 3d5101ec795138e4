//! reqwest-backed transport.

use async_trait::async_trait;
use portal_types::TransportError;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::transport::{Method, Transport, TransportRequest, TransportResponse};

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// API base URL, e.g. `https://api.portal.dev/v1`.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Bearer token sent with every request, if set.
    pub auth_token: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 30,
            auth_token: None,
        }
    }
}

/// Response envelope used by the portal backend.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Value,
}

/// Error body used by the portal backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Transport over HTTP using reqwest.
pub struct HttpTransport {
    base_url: String,
    client: Client,
    auth_token: Option<String>,
}

impl HttpTransport {
    /// Creates a transport from `config`.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            auth_token: config.auth_token,
        })
    }

    /// Full URL for a request path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url(&request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(token) = self.auth_token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %url, "Sending request");

        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, url = %url, error = %e, "Request failed");
            TransportError::network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(method = %request.method, url = %url, status = status.as_u16(), "Request rejected");
            return Err(TransportError::http(
                status.as_u16(),
                error_message(status, &body),
            ));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(TransportResponse {
                status: status.as_u16(),
                data: Value::Null,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;
        let data = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice::<Envelope>(&bytes)
                .map_err(|e| {
                    TransportError::http(status.as_u16(), format!("invalid response body: {e}"))
                })?
                .data
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            data,
        })
    }
}

/// Extracts a readable message from an error response body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default() {
        let config = HttpTransportConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn url_joins_without_double_slash() {
        let transport = HttpTransport::new(HttpTransportConfig {
            base_url: "https://api.portal.dev/v1/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            transport.url("/conversations"),
            "https://api.portal.dev/v1/conversations"
        );
    }

    #[test]
    fn auth_token_comes_from_config() {
        let transport = HttpTransport::new(HttpTransportConfig::default()).unwrap();
        assert!(transport.auth_token().is_none());

        let transport = HttpTransport::new(HttpTransportConfig {
            auth_token: Some("token-1".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(transport.auth_token(), Some("token-1"));
    }

    #[test]
    fn error_message_prefers_json_message() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"message":"text is required"}"#);
        assert_eq!(msg, "text is required");
    }

    #[test]
    fn error_message_falls_back_to_body_or_reason() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down\n"),
            "upstream down"
        );
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }
}
