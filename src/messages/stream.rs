//! Streaming events and folding them back into a [`Message`].
//!
//! SSE framing belongs to the transport. Everything here starts from one
//! already-delimited `data:` payload per event.

use bytes::Bytes;
use futures::Stream;
use serde_json::Value;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

use super::citations::TextCitation;
use super::content::ContentBlock;
use super::errors::ErrorObject;
use super::message::{Message, MessageDelta, MessageDeltaUsage};
use crate::core::error::{DataError, LlmError};
use crate::core::record::Record;
use crate::core::union::discriminator;
use crate::{record, union};

#[record(tag = "text_delta")]
pub struct TextDelta {
    pub text: String,
}

#[record(tag = "input_json_delta")]
pub struct InputJsonDelta {
    pub partial_json: String,
}

#[record(tag = "thinking_delta")]
pub struct ThinkingDelta {
    pub thinking: String,
}

#[record(tag = "signature_delta")]
pub struct SignatureDelta {
    pub signature: String,
}

#[record(tag = "citations_delta")]
pub struct CitationsDelta {
    pub citation: TextCitation,
}

#[union(open)]
pub enum ContentBlockDelta {
    #[variant(tag = "text_delta")]
    Text(TextDelta),
    #[variant(tag = "input_json_delta")]
    InputJson(InputJsonDelta),
    #[variant(tag = "thinking_delta")]
    Thinking(ThinkingDelta),
    #[variant(tag = "signature_delta")]
    Signature(SignatureDelta),
    #[variant(tag = "citations_delta")]
    Citations(CitationsDelta),
    #[variant(unknown)]
    Unknown(Value),
}

#[record(tag = "message_start")]
pub struct MessageStartEvent {
    pub message: Message,
}

#[record(tag = "message_delta")]
pub struct MessageDeltaEvent {
    pub delta: MessageDelta,
    pub usage: MessageDeltaUsage,
}

#[record(tag = "message_stop")]
pub struct MessageStopEvent {}

#[record(tag = "content_block_start")]
pub struct ContentBlockStartEvent {
    pub index: usize,
    pub content_block: ContentBlock,
}

#[record(tag = "content_block_delta")]
pub struct ContentBlockDeltaEvent {
    pub index: usize,
    pub delta: ContentBlockDelta,
}

#[record(tag = "content_block_stop")]
pub struct ContentBlockStopEvent {
    pub index: usize,
}

#[record(tag = "ping")]
pub struct PingEvent {}

#[record(tag = "error")]
pub struct ErrorEvent {
    pub error: ErrorObject,
}

/// One server-sent event of a streamed message.
#[union(open)]
pub enum StreamEvent {
    #[variant(tag = "message_start")]
    MessageStart(MessageStartEvent),
    #[variant(tag = "message_delta")]
    MessageDelta(MessageDeltaEvent),
    #[variant(tag = "message_stop")]
    MessageStop(MessageStopEvent),
    #[variant(tag = "content_block_start")]
    ContentBlockStart(ContentBlockStartEvent),
    #[variant(tag = "content_block_delta")]
    ContentBlockDelta(ContentBlockDeltaEvent),
    #[variant(tag = "content_block_stop")]
    ContentBlockStop(ContentBlockStopEvent),
    #[variant(tag = "ping")]
    Ping(PingEvent),
    #[variant(tag = "error")]
    Error(ErrorEvent),
    #[variant(unknown)]
    Unknown(Value),
}

/// Decode one event payload.
pub fn decode_event(payload: &[u8]) -> Result<StreamEvent, DataError> {
    let value: Value = serde_json::from_slice(payload)?;
    Ok(StreamEvent::decode(value))
}

/// Decode a stream of event payloads, one payload per item.
pub fn events<S, E>(stream: S) -> impl Stream<Item = Result<StreamEvent, LlmError>>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    stream.map(|chunk| -> Result<StreamEvent, LlmError> {
        let payload = chunk.map_err(|e| LlmError::Network {
            message: "Event stream failed".to_string(),
            source: Box::new(e),
        })?;
        Ok(decode_event(&payload)?)
    })
}

/// Folds stream events into the final [`Message`].
#[derive(Debug, Default)]
pub struct MessageAccumulator {
    message: Option<Message>,
    blocks: Vec<ContentBlock>,
    partial_json: Vec<String>,
    complete: bool,
}

impl MessageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `message_stop` has been seen.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn push(&mut self, event: StreamEvent) -> Result<(), LlmError> {
        match event {
            StreamEvent::MessageStart(event) => {
                let message = event.message()?;
                self.blocks = message.content()?;
                self.partial_json = vec![String::new(); self.blocks.len()];
                self.message = Some(message);
            }
            StreamEvent::ContentBlockStart(event) => {
                self.started()?;
                let index = event.index()?;
                if index != self.blocks.len() {
                    return Err(LlmError::Stream {
                        message: format!(
                            "content block {index} started out of order, expected {}",
                            self.blocks.len()
                        ),
                    });
                }
                self.blocks.push(event.content_block()?);
                self.partial_json.push(String::new());
            }
            StreamEvent::ContentBlockDelta(event) => {
                let index = event.index()?;
                let delta = event.delta()?;
                self.apply_delta(index, delta)?;
            }
            StreamEvent::ContentBlockStop(event) => {
                let index = event.index()?;
                self.finish_block(index)?;
            }
            StreamEvent::MessageDelta(event) => {
                let delta = event.delta()?;
                let usage = event.usage()?;
                self.apply_message_delta(delta, usage)?;
            }
            StreamEvent::MessageStop(_) => self.complete = true,
            StreamEvent::Ping(_) => trace!("ping"),
            StreamEvent::Error(event) => {
                let error = event.error()?;
                return Err(LlmError::Api {
                    message: error.message()?,
                    status_code: None,
                    error: Some(error),
                    request_id: None,
                });
            }
            StreamEvent::Unknown(raw) => {
                // An error event whose error type is new still ends the stream.
                if discriminator(&raw, "type") == Some("error") {
                    let message = raw
                        .pointer("/error/message")
                        .and_then(Value::as_str)
                        .unwrap_or("unrecognized stream error")
                        .to_string();
                    return Err(LlmError::Api {
                        message,
                        status_code: None,
                        error: None,
                        request_id: None,
                    });
                }
                debug!(event = ?discriminator(&raw, "type"), "ignoring unrecognized stream event");
            }
        }
        Ok(())
    }

    /// The assembled message. Fails unless the stream ran to `message_stop`.
    pub fn finish(self) -> Result<Message, LlmError> {
        if !self.complete {
            return Err(LlmError::Stream {
                message: "stream ended before message_stop".to_string(),
            });
        }
        let mut message = self.message.ok_or_else(|| LlmError::Stream {
            message: "stream ended before message_start".to_string(),
        })?;
        message.set_content(self.blocks)?;
        Ok(message)
    }

    /// Drain an event stream and return the assembled message.
    pub async fn collect<S>(stream: S) -> Result<Message, LlmError>
    where
        S: Stream<Item = Result<StreamEvent, LlmError>>,
    {
        let mut stream = std::pin::pin!(stream);
        let mut accumulator = Self::new();
        while let Some(event) = stream.next().await {
            accumulator.push(event?)?;
            if accumulator.is_complete() {
                break;
            }
        }
        accumulator.finish()
    }

    fn started(&self) -> Result<(), LlmError> {
        match self.message {
            Some(_) => Ok(()),
            None => Err(LlmError::Stream {
                message: "event received before message_start".to_string(),
            }),
        }
    }

    fn apply_delta(&mut self, index: usize, delta: ContentBlockDelta) -> Result<(), LlmError> {
        let block = block_at(&mut self.blocks, index)?;
        match (block, delta) {
            (ContentBlock::Unknown(_), _) | (_, ContentBlockDelta::Unknown(_)) => {
                debug!(index, "ignoring delta for an unrecognized block or delta type");
            }
            (ContentBlock::Text(text), ContentBlockDelta::Text(delta)) => {
                let mut current = text.text()?;
                current.push_str(&delta.text()?);
                text.set_text(current)?;
            }
            (ContentBlock::Text(text), ContentBlockDelta::Citations(delta)) => {
                let mut citations = text.citations()?.unwrap_or_default();
                citations.push(delta.citation()?);
                text.set_citations(citations)?;
            }
            (ContentBlock::Thinking(thinking), ContentBlockDelta::Thinking(delta)) => {
                let mut current = thinking.thinking()?;
                current.push_str(&delta.thinking()?);
                thinking.set_thinking(current)?;
            }
            (ContentBlock::Thinking(thinking), ContentBlockDelta::Signature(delta)) => {
                let mut current: String = thinking
                    .record()
                    .optional("signature")?
                    .unwrap_or_default();
                current.push_str(&delta.signature()?);
                thinking.set_signature(current)?;
            }
            (
                ContentBlock::ToolUse(_) | ContentBlock::ServerToolUse(_),
                ContentBlockDelta::InputJson(delta),
            ) => {
                let partial = delta.partial_json()?;
                if let Some(buffer) = self.partial_json.get_mut(index) {
                    buffer.push_str(&partial);
                }
            }
            (block, delta) => {
                return Err(LlmError::Stream {
                    message: format!(
                        "{} cannot be applied to a {} block",
                        delta.discriminator().unwrap_or("delta"),
                        block.discriminator().unwrap_or("content"),
                    ),
                });
            }
        }
        Ok(())
    }

    fn finish_block(&mut self, index: usize) -> Result<(), LlmError> {
        let buffer = match self.partial_json.get_mut(index) {
            Some(buffer) => std::mem::take(buffer),
            None => String::new(),
        };
        let block = block_at(&mut self.blocks, index)?;
        if !matches!(block, ContentBlock::ToolUse(_) | ContentBlock::ServerToolUse(_)) {
            return Ok(());
        }

        let input = if buffer.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&buffer).map_err(|e| LlmError::Parse {
                message: format!("tool input of content block {index} is not valid JSON"),
                source: Box::new(e),
            })?
        };
        if let Some(record) = block.record_mut() {
            record.insert_raw("input", input);
        }
        Ok(())
    }

    fn apply_message_delta(
        &mut self,
        delta: MessageDelta,
        usage: MessageDeltaUsage,
    ) -> Result<(), LlmError> {
        let message = self.message.as_mut().ok_or_else(|| LlmError::Stream {
            message: "event received before message_start".to_string(),
        })?;

        for (key, value) in delta.into_record().into_map() {
            message.record_mut().insert_raw(key, value);
        }

        let mut merged = message.usage()?;
        for (key, value) in usage.into_record().into_map() {
            if !value.is_null() {
                merged.record_mut().insert_raw(key, value);
            }
        }
        message.set_usage(merged)?;
        Ok(())
    }
}

fn block_at(blocks: &mut [ContentBlock], index: usize) -> Result<&mut ContentBlock, LlmError> {
    let len = blocks.len();
    blocks.get_mut(index).ok_or_else(|| LlmError::Stream {
        message: format!("event for content block {index}, but only {len} started"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::message::StopReason;
    use serde_json::json;

    fn event(value: Value) -> StreamEvent {
        decode_event(value.to_string().as_bytes()).unwrap()
    }

    fn start() -> StreamEvent {
        event(json!({
            "type": "message_start",
            "message": {
                "id": "msg_01", "type": "message", "role": "assistant",
                "model": "claude-sonnet-4-5", "content": [],
                "stop_reason": null, "stop_sequence": null,
                "usage": { "input_tokens": 25, "output_tokens": 1 }
            }
        }))
    }

    #[test]
    fn unknown_events_decode_permissively() {
        let ev = event(json!({ "type": "thought_bubble", "bubble": 1 }));
        assert!(ev.is_unknown());
        assert_eq!(ev.discriminator(), Some("thought_bubble"));
    }

    #[test]
    fn unparseable_payloads_are_json_errors() {
        assert!(matches!(decode_event(b"{not json"), Err(DataError::Json(_))));
    }

    #[test]
    fn assembles_text_and_tool_input() {
        let mut acc = MessageAccumulator::new();
        for ev in [
            start(),
            event(json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}})),
            event(json!({"type": "ping"})),
            event(json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Let me "}})),
            event(json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "check."}})),
            event(json!({"type": "content_block_stop", "index": 0})),
            event(json!({"type": "content_block_start", "index": 1, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {}}})),
            event(json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "{\"city\": "}})),
            event(json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "\"Lisbon\"}"}})),
            event(json!({"type": "content_block_stop", "index": 1})),
            event(json!({"type": "message_delta", "delta": {"stop_reason": "tool_use", "stop_sequence": null}, "usage": {"output_tokens": 42}})),
            event(json!({"type": "message_stop"})),
        ] {
            acc.push(ev).unwrap();
        }

        let message = acc.finish().unwrap();
        let content = message.content().unwrap();
        assert_eq!(content[0].as_text().unwrap().text().unwrap(), "Let me check.");
        assert_eq!(content[1].as_tool_use().unwrap().input().unwrap(), json!({ "city": "Lisbon" }));
        assert_eq!(message.stop_reason().unwrap().unwrap(), StopReason::ToolUse);

        let usage = message.usage().unwrap();
        assert_eq!(usage.input_tokens().unwrap(), 25);
        assert_eq!(usage.output_tokens().unwrap(), 42);
    }

    #[test]
    fn empty_tool_input_becomes_an_empty_object() {
        let mut acc = MessageAccumulator::new();
        acc.push(start()).unwrap();
        acc.push(event(json!({"type": "content_block_start", "index": 0, "content_block": {"type": "tool_use", "id": "t", "name": "now", "input": {}}}))).unwrap();
        acc.push(event(json!({"type": "content_block_stop", "index": 0}))).unwrap();
        acc.push(event(json!({"type": "message_stop"}))).unwrap();

        let message = acc.finish().unwrap();
        assert_eq!(message.content().unwrap()[0].as_tool_use().unwrap().input().unwrap(), json!({}));
    }

    #[test]
    fn deltas_for_unknown_blocks_are_ignored() {
        let mut acc = MessageAccumulator::new();
        acc.push(start()).unwrap();
        acc.push(event(json!({"type": "content_block_start", "index": 0, "content_block": {"type": "hologram", "depth": 1}}))).unwrap();
        acc.push(event(json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "x"}}))).unwrap();
        acc.push(event(json!({"type": "content_block_stop", "index": 0}))).unwrap();
        acc.push(event(json!({"type": "message_stop"}))).unwrap();

        let message = acc.finish().unwrap();
        assert_eq!(
            message.content().unwrap()[0],
            ContentBlock::Unknown(json!({"type": "hologram", "depth": 1}))
        );
    }

    #[test]
    fn out_of_order_blocks_are_stream_errors() {
        let mut acc = MessageAccumulator::new();
        acc.push(start()).unwrap();
        let err = acc
            .push(event(json!({"type": "content_block_start", "index": 2, "content_block": {"type": "text", "text": ""}})))
            .unwrap_err();
        assert!(matches!(err, LlmError::Stream { .. }));
    }

    #[test]
    fn error_events_surface_as_api_errors() {
        let mut acc = MessageAccumulator::new();
        acc.push(start()).unwrap();
        let err = acc
            .push(event(json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}})))
            .unwrap_err();
        match err {
            LlmError::Api { message, error, .. } => {
                assert_eq!(message, "Overloaded");
                assert!(error.unwrap().is_overloaded());
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = MessageAccumulator::new()
            .push(event(json!({"type": "error", "error": {"type": "brand_new_error", "message": "huh"}})))
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { error: None, ref message, .. } if message == "huh"));
    }

    #[test]
    fn finishing_early_is_an_error() {
        let mut acc = MessageAccumulator::new();
        acc.push(start()).unwrap();
        assert!(matches!(acc.finish(), Err(LlmError::Stream { .. })));
    }

    #[tokio::test]
    async fn collects_a_byte_stream() {
        let payloads = [
            start(),
            event(json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}})),
            event(json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hi"}})),
            event(json!({"type": "content_block_stop", "index": 0})),
            event(json!({"type": "message_stop"})),
        ]
        .map(|ev| Ok::<_, std::io::Error>(Bytes::from(serde_json::to_vec(&ev).unwrap())));

        let message = MessageAccumulator::collect(events(tokio_stream::iter(payloads)))
            .await
            .unwrap();
        assert_eq!(message.text().unwrap(), "Hi");
    }
}
