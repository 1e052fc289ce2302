//! JSON-over-HTTP engine transport.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::engine::{Engine, EngineError, ReadResourceRequest, ReadResourceResponse};

/// HTTP client for a provisioning engine.
///
/// Sends `POST {endpoint}/v1/resources/read` with the request as JSON.
/// Requests are not retried.
#[derive(Clone)]
pub struct HttpEngine {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpEngine {
    /// Creates a new engine client for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Sends the token as a bearer credential with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Uses a preconfigured HTTP client (timeouts, proxies, TLS).
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The engine endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Engine for HttpEngine {
    async fn read_resource(
        &self,
        request: ReadResourceRequest,
    ) -> Result<ReadResourceResponse, EngineError> {
        let url = format!("{}/v1/resources/read", self.endpoint);

        let mut builder = self.client.post(&url).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| EngineError::Unavailable(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| EngineError::Unavailable(err.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            return Err(EngineError::NotFound {
                type_token: request.type_token,
                id: request.id.to_string(),
            });
        }

        if !status.is_success() {
            return Err(EngineError::Internal {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|err| {
            EngineError::InvalidResponse(format!("failed to parse response: {err}\nBody: {body}"))
        })
    }
}

impl core::fmt::Debug for HttpEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpEngine")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
