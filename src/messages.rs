//! Wire types of the Messages and Message Batches APIs.

pub mod batches;
pub mod citations;
pub mod content;
pub mod errors;
pub mod message;
pub mod params;
pub mod sources;
pub mod stream;
pub mod tools;

pub use batches::{
    BatchCancelParams, BatchCreateParams, BatchIndividualResponse, BatchList, BatchListParams,
    BatchRequest, BatchResult, BatchRetrieveParams, MessageBatch, ProcessingStatus, RequestCounts,
    decode_batch_results,
};
pub use citations::{CitationsConfig, TextCitation};
pub use content::{
    CacheControl, ContentBlock, DocumentBlock, ImageBlock, MessageContent, RedactedThinkingBlock,
    ServerToolUseBlock, SystemPrompt, TextBlock, ThinkingBlock, ToolResultBlock,
    ToolResultContent, ToolUseBlock, WebSearchErrorCode, WebSearchResultBlock,
    WebSearchToolResultBlock, WebSearchToolResultContent, WebSearchToolResultError,
};
pub use errors::{ErrorObject, ErrorResponse};
pub use message::{
    Message, MessageDelta, MessageDeltaUsage, MessageParam, Role, ServerToolUsage, ServiceTier,
    StopReason, Usage,
};
pub use params::{
    MessageCountTokensParams, MessageCreateParams, MessageTokensCount, Metadata, ThinkingConfig,
};
pub use sources::{DocumentSource, ImageMediaType, ImageSource};
pub use stream::{
    ContentBlockDelta, MessageAccumulator, StreamEvent, decode_event, events,
};
pub use tools::{Tool, ToolChoice, ToolDefinition, WebSearchTool};
