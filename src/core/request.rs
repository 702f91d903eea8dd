//! Request partitioning and the typed client helper.

use reqwest::Method;
use serde_json::Value;

use super::error::{DataError, LlmError};
use super::http::{HttpClient, HttpClientConfig, Transport};
use super::record::{RawRecord, Record};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// A request split into the three places its fields travel.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, starting with `/`.
    pub path: String,
    pub body: Option<RawRecord>,
    pub headers: RawRecord,
    pub query: RawRecord,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: RawRecord::new(),
            query: RawRecord::new(),
        }
    }

    pub fn with_body(mut self, body: RawRecord) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: RawRecord) -> Self {
        self.query = query;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.headers.insert_raw(name, value.into());
        self
    }

    /// Move a body field into the header partition under `header`.
    ///
    /// Does nothing when the body has no such field.
    pub fn body_to_header(mut self, key: &str, header: &str) -> Self {
        if let Some(value) = self.body.as_mut().and_then(|body| body.remove(key)) {
            self.headers.insert_raw(header, value);
        }
        self
    }

    /// Headers as strings, in insertion order. Null values are skipped.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        render_pairs(&self.headers)
    }

    /// Query parameters as strings, in insertion order. Null values are skipped.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        render_pairs(&self.query)
    }
}

fn render_pairs(record: &RawRecord) -> Vec<(String, String)> {
    record
        .as_map()
        .iter()
        .filter_map(|(key, value)| render_param(value).map(|v| (key.clone(), v)))
        .collect()
}

/// Render a header or query value without JSON quoting. Arrays are joined
/// with commas.
fn render_param(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(render_param)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

/// A request type that knows its endpoint and response type.
pub trait IntoApiRequest {
    type Response: Record;

    /// Split the request into its partitions. Fails when a field that has to
    /// travel in the path is missing or unusable.
    fn into_api_request(self) -> Result<ApiRequest, DataError>;
}

/// Remove `key` from `record` and return it encoded as a single path segment.
pub fn take_path_segment(record: &mut RawRecord, key: &str) -> Result<String, DataError> {
    let value: String = record.require(key)?;
    record.remove(key);
    if value.is_empty() || value.chars().all(|c| c == '.') {
        return Err(DataError::InvalidPathSegment {
            key: key.to_string(),
            value,
        });
    }
    Ok(urlencoding::encode(&value).into_owned())
}

/// Connection settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_version: String,
    /// Beta features sent with every request, merged with per-request betas.
    pub beta: Vec<String>,
    pub user_agent: Option<String>,
    pub http: HttpClientConfig,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            beta: Vec::new(),
            user_agent: None,
            http: HttpClientConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_beta(mut self, feature: impl Into<String>) -> Self {
        self.beta.push(feature.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_http(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }
}

/// Sends typed requests over any [`Transport`] and decodes the responses.
pub struct MessagesClient<T> {
    transport: T,
}

impl MessagesClient<HttpClient> {
    pub fn from_config(config: ClientConfig) -> Result<Self, LlmError> {
        Ok(Self::new(HttpClient::new(config)?))
    }
}

impl<T: Transport> MessagesClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request` and decode the body as its response type.
    ///
    /// The body is decoded leniently; call `validate()` on the result when
    /// every field must be present and recognised.
    pub async fn send<R: IntoApiRequest>(&self, request: R) -> Result<R::Response, LlmError> {
        let value = self.transport.execute(request.into_api_request()?).await?;
        Ok(R::Response::from_value(value)?)
    }
}
