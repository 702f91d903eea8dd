use serde_json::Value;

use super::content::{ContentBlock, MessageContent};
use crate::core::error::DataError;
use crate::core::open_enum::OpenEnum;
use crate::core::record::Record;
use crate::{api_enum, record};

#[api_enum]
pub enum Role {
    User,
    Assistant,
}

#[api_enum]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    PauseTurn,
    Refusal,
}

#[api_enum]
pub enum ServiceTier {
    Standard,
    Priority,
    Batch,
}

#[record]
pub struct ServerToolUsage {
    pub web_search_requests: u64,
}

/// Billing and rate-limit usage.
#[record]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
    pub server_tool_use: Option<ServerToolUsage>,
    pub service_tier: Option<OpenEnum<ServiceTier>>,
}

/// A response from the model.
#[record(tag = "message")]
pub struct Message {
    pub id: String,
    pub role: OpenEnum<Role>,
    pub model: String,
    pub content: Vec<ContentBlock>,
    #[field(nullable)]
    pub stop_reason: Option<OpenEnum<StopReason>>,
    #[field(nullable)]
    pub stop_sequence: Option<String>,
    pub usage: Usage,
}

impl Message {
    /// Concatenated text of every text block.
    pub fn text(&self) -> Result<String, DataError> {
        let mut out = String::new();
        for block in self.content()? {
            if let ContentBlock::Text(text) = block {
                out.push_str(&text.text()?);
            }
        }
        Ok(out)
    }
}

/// One turn of input conversation.
#[record]
pub struct MessageParam {
    pub role: OpenEnum<Role>,
    pub content: MessageContent,
}

impl MessageParam {
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Result<Self, DataError> {
        let mut param = Self::default();
        param.set_role(role)?;
        param.set_content(content)?;
        Ok(param)
    }

    pub fn user(content: impl Into<MessageContent>) -> Result<Self, DataError> {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Result<Self, DataError> {
        Self::new(Role::Assistant, content)
    }
}

impl From<Message> for MessageParam {
    /// Feed a response back into the conversation as an assistant turn.
    fn from(message: Message) -> Self {
        let mut record = message.into_record();
        let role = record.remove("role").unwrap_or(Value::Null);
        let content = record.remove("content").unwrap_or(Value::Null);

        let mut param = Self::default();
        param.record_mut().insert_raw("role", role);
        param.record_mut().insert_raw("content", content);
        param
    }
}

/// Top-level changes carried by a `message_delta` event.
#[record]
pub struct MessageDelta {
    pub stop_reason: Option<OpenEnum<StopReason>>,
    pub stop_sequence: Option<String>,
}

/// Cumulative usage reported by a `message_delta` event.
#[record]
pub struct MessageDeltaUsage {
    pub output_tokens: u64,
    pub input_tokens: Option<u64>,
    pub cache_creation_input_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
    pub server_tool_use: Option<ServerToolUsage>,
}
