//! HTTP transport with retry logic.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::LlmError;
use super::record::Record;
use super::request::{ApiRequest, ClientConfig};
use crate::messages::ErrorResponse;

const BETA_HEADER: &str = "anthropic-beta";

/// Configuration for HTTP client resilience
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    /// Base duration for exponential backoff
    pub initial_retry_delay: Duration,
    /// Cap on the backoff duration
    pub max_retry_delay: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            max_retries: 2,
            initial_retry_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(8),
        }
    }
}

/// Moves an [`ApiRequest`] to the API and returns the JSON response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<Value, LlmError>;
}

/// reqwest-backed transport with retry logic and exponential backoff.
pub struct HttpClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::ProviderConfiguration(
                "API key must not be empty".to_string(),
            ));
        }

        let default_ua = format!("anthropic-types/{}", env!("CARGO_PKG_VERSION"));
        let ua = config.user_agent.as_deref().unwrap_or(&default_ua);

        let client = reqwest::Client::builder()
            .timeout(config.http.timeout)
            .user_agent(ua)
            .build()
            .map_err(|e| {
                LlmError::ProviderConfiguration(format!("Failed to build reqwest client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Request headers, with client-wide betas merged into the request's own.
    fn headers(&self, request: &ApiRequest) -> Vec<(String, String)> {
        let mut headers = vec![
            ("x-api-key".to_string(), self.config.api_key.clone()),
            (
                "anthropic-version".to_string(),
                self.config.api_version.clone(),
            ),
        ];

        let mut betas = self.config.beta.clone();
        for (name, value) in request.header_pairs() {
            if name.eq_ignore_ascii_case(BETA_HEADER) {
                betas.extend(value.split(',').map(|b| b.trim().to_string()));
            } else {
                headers.push((name, value));
            }
        }
        let mut seen = HashSet::new();
        betas.retain(|b| !b.is_empty() && seen.insert(b.clone()));
        if !betas.is_empty() {
            headers.push((BETA_HEADER.to_string(), betas.join(",")));
        }
        headers
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base_delay = self.config.http.initial_retry_delay.as_millis() as f64
            * 2_f64.powi(attempt as i32);

        // +/- 10% jitter (0.9 to 1.1)
        let jitter_factor = rand::random::<f64>() * 0.2 + 0.9;
        let delay_ms = (base_delay * jitter_factor) as u64;

        Duration::from_millis(delay_ms).min(self.config.http.max_retry_delay)
    }
}

/// Turn a non-2xx body into an API error, decoding the error envelope when
/// it has one.
fn api_error(status: StatusCode, body: &str) -> LlmError {
    let decoded = ErrorResponse::from_json(body).and_then(|response| {
        let error = response.error()?;
        Ok((error.message()?, error, response.request_id()?))
    });
    match decoded {
        Ok((message, error, request_id)) => LlmError::Api {
            message,
            status_code: Some(status.as_u16()),
            error: Some(error),
            request_id,
        },
        Err(_) => LlmError::Api {
            message: if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            },
            status_code: Some(status.as_u16()),
            error: None,
            request_id: None,
        },
    }
}

#[async_trait]
impl Transport for HttpClient {
    /// Send the request, retrying 429, 5xx and network failures.
    ///
    /// Other 4xx responses fail immediately.
    #[tracing::instrument(
        name = "anthropic_request",
        skip(self, request),
        fields(method = %request.method, path = %request.path),
        err
    )]
    async fn execute(&self, request: ApiRequest) -> Result<Value, LlmError> {
        let url = self.url(&request.path);
        let headers = self.headers(&request);
        let query = request.query_pairs();

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=self.config.http.max_retries {
            // Rebuilt every attempt since .send() consumes it
            let mut req_builder = self.client.request(request.method.clone(), &url);
            for (name, value) in &headers {
                req_builder = req_builder.header(name, value);
            }
            if !query.is_empty() {
                req_builder = req_builder.query(&query);
            }
            if let Some(body) = &request.body {
                req_builder = req_builder.json(body);
            }

            match req_builder.send().await {
                Err(e) => {
                    warn!(attempt, error = %e, "HTTP request failed, retrying");
                    last_error = Some(LlmError::Network {
                        message: format!(
                            "Request failed (attempt {}/{})",
                            attempt + 1,
                            self.config.http.max_retries + 1
                        ),
                        source: Box::new(e),
                    });
                }
                Ok(res) => {
                    let status = res.status();

                    if status.is_success() {
                        debug!(status = %status, "HTTP request successful");

                        let response_text = res.text().await.map_err(|e| LlmError::Parse {
                            message: "Failed to read response body".to_string(),
                            source: Box::new(e),
                        })?;

                        return serde_json::from_str(&response_text).map_err(|e| {
                            LlmError::Parse {
                                message: "Failed to parse response as JSON".to_string(),
                                source: Box::new(e),
                            }
                        });
                    }

                    warn!(attempt, status = %status, "API returned error status");

                    let is_retryable =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    let error_text = res.text().await.unwrap_or_default();
                    let error = api_error(status, &error_text);

                    if !is_retryable {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
            }

            if attempt < self.config.http.max_retries {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Api {
            message: format!(
                "Request failed after max retries ({}) with unknown error",
                self.config.http.max_retries
            ),
            status_code: None,
            error: None,
            request_id: None,
        }))
    }
}
