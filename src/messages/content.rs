//! Content blocks and the unions that carry them.

use serde_json::Value;

use super::citations::{CitationsConfig, TextCitation};
use super::sources::{DocumentSource, ImageSource};
use crate::core::error::DataError;
use crate::core::open_enum::OpenEnum;
use crate::core::record::Record;
use crate::{api_enum, record, union};

/// Prompt caching breakpoint.
#[record(tag = "ephemeral")]
pub struct CacheControl {
    /// `5m` or `1h`.
    pub ttl: Option<String>,
}

#[record(tag = "text")]
pub struct TextBlock {
    pub text: String,
    pub citations: Option<Vec<TextCitation>>,
    pub cache_control: Option<CacheControl>,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        let mut block = Self::default();
        block.record_mut().insert_raw("text", Value::String(text.into()));
        block
    }
}

#[record(tag = "image")]
pub struct ImageBlock {
    pub source: ImageSource,
    pub cache_control: Option<CacheControl>,
}

impl ImageBlock {
    pub fn new(source: impl Into<ImageSource>) -> Result<Self, DataError> {
        let mut block = Self::default();
        block.set_source(source)?;
        Ok(block)
    }
}

#[record(tag = "document")]
pub struct DocumentBlock {
    pub source: DocumentSource,
    pub title: Option<String>,
    pub context: Option<String>,
    pub citations: Option<CitationsConfig>,
    pub cache_control: Option<CacheControl>,
}

impl DocumentBlock {
    pub fn new(source: impl Into<DocumentSource>) -> Result<Self, DataError> {
        let mut block = Self::default();
        block.set_source(source)?;
        Ok(block)
    }
}

#[record(tag = "tool_use")]
pub struct ToolUseBlock {
    pub id: String,
    pub name: String,
    /// Arguments as produced by the model, kept as raw JSON.
    pub input: Value,
    pub cache_control: Option<CacheControl>,
}

impl ToolUseBlock {
    /// Decode the tool input into the caller's argument type.
    pub fn input_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, DataError> {
        let input: Value = self.record().require("input")?;
        T::deserialize(&input).map_err(|source| DataError::MalformedField {
            key: "input".to_string(),
            expected: std::any::type_name::<T>(),
            source,
        })
    }
}

#[record(tag = "tool_result")]
pub struct ToolResultBlock {
    pub tool_use_id: String,
    pub content: Option<ToolResultContent>,
    pub is_error: Option<bool>,
    pub cache_control: Option<CacheControl>,
}

impl ToolResultBlock {
    pub fn new(
        tool_use_id: impl Into<String>,
        content: impl Into<ToolResultContent>,
    ) -> Result<Self, DataError> {
        let mut block = Self::default();
        block.set_tool_use_id(tool_use_id.into())?;
        block.set_content(content)?;
        Ok(block)
    }
}

#[record(tag = "thinking")]
pub struct ThinkingBlock {
    pub thinking: String,
    pub signature: String,
}

#[record(tag = "redacted_thinking")]
pub struct RedactedThinkingBlock {
    pub data: String,
}

#[record(tag = "server_tool_use")]
pub struct ServerToolUseBlock {
    pub id: String,
    /// Currently always `web_search`.
    pub name: String,
    pub input: Value,
    pub cache_control: Option<CacheControl>,
}

#[api_enum]
pub enum WebSearchErrorCode {
    InvalidToolInput,
    Unavailable,
    MaxUsesExceeded,
    TooManyRequests,
    QueryTooLong,
}

#[record(tag = "web_search_tool_result_error")]
pub struct WebSearchToolResultError {
    pub error_code: OpenEnum<WebSearchErrorCode>,
}

#[record(tag = "web_search_result")]
pub struct WebSearchResultBlock {
    pub encrypted_content: String,
    #[field(nullable)]
    pub page_age: Option<String>,
    pub title: String,
    pub url: String,
}

/// Outcome of a server-side web search.
///
/// The error shape is tried first: it is a single object, while a result
/// list is an array, so the order only matters for malformed input.
#[union(ordered)]
pub enum WebSearchToolResultContent {
    Error(WebSearchToolResultError),
    Results(Vec<WebSearchResultBlock>),
}

#[record(tag = "web_search_tool_result")]
pub struct WebSearchToolResultBlock {
    pub tool_use_id: String,
    pub content: WebSearchToolResultContent,
    pub cache_control: Option<CacheControl>,
}

/// A block of message content.
///
/// Blocks added to the API after this build decode as [`ContentBlock::Unknown`]
/// and are written back unchanged.
#[union(open)]
pub enum ContentBlock {
    #[variant(tag = "text")]
    Text(TextBlock),
    #[variant(tag = "image")]
    Image(ImageBlock),
    #[variant(tag = "document")]
    Document(DocumentBlock),
    #[variant(tag = "tool_use")]
    ToolUse(ToolUseBlock),
    #[variant(tag = "tool_result")]
    ToolResult(ToolResultBlock),
    #[variant(tag = "thinking")]
    Thinking(ThinkingBlock),
    #[variant(tag = "redacted_thinking")]
    RedactedThinking(RedactedThinkingBlock),
    #[variant(tag = "server_tool_use")]
    ServerToolUse(ServerToolUseBlock),
    #[variant(tag = "web_search_tool_result")]
    WebSearchToolResult(WebSearchToolResultBlock),
    #[variant(unknown)]
    Unknown(Value),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextBlock::new(text))
    }

    /// Mutable access to the backing record of whichever block this is.
    pub(crate) fn record_mut(&mut self) -> Option<&mut crate::core::record::RawRecord> {
        match self {
            Self::Text(b) => Some(b.record_mut()),
            Self::Image(b) => Some(b.record_mut()),
            Self::Document(b) => Some(b.record_mut()),
            Self::ToolUse(b) => Some(b.record_mut()),
            Self::ToolResult(b) => Some(b.record_mut()),
            Self::Thinking(b) => Some(b.record_mut()),
            Self::RedactedThinking(b) => Some(b.record_mut()),
            Self::ServerToolUse(b) => Some(b.record_mut()),
            Self::WebSearchToolResult(b) => Some(b.record_mut()),
            Self::Unknown(_) => None,
        }
    }
}

/// Content of a tool result: plain text or a list of blocks.
#[union(ordered)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl From<&str> for ToolResultContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Content of a message parameter: plain text or a list of blocks.
#[union(ordered)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<ContentBlock> for MessageContent {
    fn from(block: ContentBlock) -> Self {
        Self::Blocks(vec![block])
    }
}

/// System prompt: plain text or a list of text blocks.
#[union(ordered)]
pub enum SystemPrompt {
    Text(String),
    Blocks(Vec<TextBlock>),
}

impl From<&str> for SystemPrompt {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}
