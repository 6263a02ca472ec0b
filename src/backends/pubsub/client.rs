// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::api::{
    AcknowledgeRequest, ApiResponse, HttpSize, PubSubApi, PublishRequest, PublishResponse,
    PullRequest, PullResponse,
};
use crate::config::{PubSubConfig, TrampolineConfig};
use crate::errors::TransportError;

/// Slack added on top of the long-poll wait before a pull is abandoned.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

/// [`PubSubApi`] over HTTPS with `reqwest`.
///
/// Requests are `POST {endpoint}/{resource}:{verb}` with a JSON body and,
/// when configured, a bearer token.
#[derive(Debug, Clone)]
pub struct HttpPubSubClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    request_timeout: Duration,
}

impl HttpPubSubClient {
    pub fn new(cfg: &PubSubConfig, request_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            access_token: cfg.access_token.clone(),
            request_timeout,
        }
    }

    pub fn from_config(cfg: &TrampolineConfig) -> Self {
        Self::new(&cfg.pubsub, cfg.long_poll_wait() + REQUEST_TIMEOUT_SLACK)
    }

    fn url(&self, resource: &str, verb: &str) -> String {
        format!("{}/{}:{}", self.endpoint, resource, verb)
    }

    async fn post<B, R>(
        &self,
        operation: &str,
        resource: &str,
        verb: &str,
        body: &B,
    ) -> Result<ApiResponse<R>, TransportError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(self.url(resource, verb))
            .timeout(self.request_timeout)
            .json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(operation, e))?;

        let status = response.status();
        let header_bytes = header_size(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify(operation, e))?;

        if !status.is_success() {
            return Err(status_error(operation, resource, status, &bytes));
        }

        let body = serde_json::from_slice(&bytes).map_err(|e| TransportError::InvalidResponse {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;

        Ok(ApiResponse {
            body,
            size: HttpSize {
                header_bytes,
                content_length: bytes.len() as u64,
            },
        })
    }
}

/// Approximate header bytes as sent: `name: value\r\n` per header.
fn header_size(headers: &HeaderMap) -> u64 {
    headers
        .iter()
        .map(|(name, value)| (name.as_str().len() + value.as_bytes().len() + 4) as u64)
        .sum()
}

fn classify(operation: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            operation: operation.to_string(),
        }
    } else {
        TransportError::network(operation, error)
    }
}

fn status_error(operation: &str, resource: &str, status: StatusCode, body: &[u8]) -> TransportError {
    match status {
        StatusCode::NOT_FOUND => TransportError::ChannelNotFound {
            channel: resource.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => TransportError::Throttled {
            operation: operation.to_string(),
        },
        _ => TransportError::Http {
            operation: operation.to_string(),
            status: status.as_u16(),
            reason: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

#[async_trait]
impl PubSubApi for HttpPubSubClient {
    async fn publish(
        &self,
        topic: &str,
        request: &PublishRequest,
    ) -> Result<ApiResponse<PublishResponse>, TransportError> {
        self.post("publish", topic, "publish", request).await
    }

    async fn pull(
        &self,
        subscription: &str,
        request: &PullRequest,
    ) -> Result<ApiResponse<PullResponse>, TransportError> {
        self.post("pull", subscription, "pull", request).await
    }

    async fn acknowledge(
        &self,
        subscription: &str,
        request: &AcknowledgeRequest,
    ) -> Result<(), TransportError> {
        self.post::<_, serde_json::Value>("acknowledge", subscription, "acknowledge", request)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONTENT_TYPE};

    #[test]
    fn test_url_joins_resource_and_verb() {
        let cfg = PubSubConfig {
            endpoint: "http://localhost:8085/v1/".to_string(),
            access_token: None,
        };
        let client = HttpPubSubClient::new(&cfg, Duration::from_secs(1));
        assert_eq!(
            client.url("projects/p/topics/replies", "publish"),
            "http://localhost:8085/v1/projects/p/topics/replies:publish"
        );
    }

    #[test]
    fn test_from_config_adds_slack_to_long_poll() {
        let cfg = TrampolineConfig::default();
        let client = HttpPubSubClient::from_config(&cfg);
        assert_eq!(client.request_timeout, cfg.long_poll_wait() + REQUEST_TIMEOUT_SLACK);
        assert_eq!(client.endpoint, "https://pubsub.googleapis.com/v1");
    }

    #[test]
    fn test_status_classification() {
        let not_found = status_error("publish", "projects/p/topics/t", StatusCode::NOT_FOUND, b"");
        assert!(matches!(not_found, TransportError::ChannelNotFound { channel } if channel == "projects/p/topics/t"));

        let throttled = status_error("publish", "t", StatusCode::TOO_MANY_REQUESTS, b"");
        assert!(throttled.is_retryable());

        let unavailable = status_error("pull", "s", StatusCode::SERVICE_UNAVAILABLE, b"try later");
        assert!(unavailable.is_retryable());
        assert!(unavailable.to_string().contains("try later"));

        let forbidden = status_error("pull", "s", StatusCode::FORBIDDEN, b"denied");
        assert!(!forbidden.is_retryable());
    }

    #[test]
    fn test_header_size() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        // "content-type" (12) + "application/json" (16) + ": " + "\r\n"
        assert_eq!(header_size(&headers), 32);
    }
}
