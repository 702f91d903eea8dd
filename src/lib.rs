//! # anthropic-types
//!
//! Wire types for the Anthropic Messages API that survive the API changing
//! underneath them.
//!
//! Every object type is a thin view over an ordered JSON record, so fields
//! this build does not know about are written back exactly as they were
//! read. Polymorphic payloads decode through one of three union policies:
//!
//! - **closed** unions (errors, batch results, tool choice) fail with a
//!   structured [`DataError`] when a payload does not fit;
//! - **open** unions (content blocks, citations, stream events) keep what
//!   they do not recognise in an `Unknown` variant;
//! - **ordered** unions (`string | [block]` style fields) try each shape in
//!   declaration order.
//!
//! ## Quick Start
//!
//! ```rust
//! use anthropic_types::messages::{ContentBlock, Message, StopReason};
//! use anthropic_types::{Record, Validate};
//!
//! let message = Message::from_json(r#"{
//!     "id": "msg_01",
//!     "type": "message",
//!     "role": "assistant",
//!     "model": "claude-sonnet-4-5",
//!     "content": [
//!         {"type": "text", "text": "Hello"},
//!         {"type": "holographic_block", "depth": 3}
//!     ],
//!     "stop_reason": "end_turn",
//!     "stop_sequence": null,
//!     "usage": {"input_tokens": 10, "output_tokens": 2}
//! }"#).unwrap();
//!
//! let content = message.content().unwrap();
//! assert_eq!(content[0].as_text().unwrap().text().unwrap(), "Hello");
//! assert!(content[1].is_unknown());
//! assert_eq!(message.stop_reason().unwrap().unwrap(), StopReason::EndTurn);
//!
//! // The unknown block is still there, and strict callers can refuse it.
//! assert!(message.validate().is_err());
//! assert!(message.to_json().contains("holographic_block"));
//! ```

extern crate self as anthropic_types;

pub mod core;
pub mod messages;

pub use crate::core::error::{DataError, LlmError, VariantAttempt};
pub use crate::core::http::{HttpClient, HttpClientConfig, Transport};
pub use crate::core::open_enum::{KnownValue, OpenEnum};
pub use crate::core::record::{FieldValue, RawRecord, Record, Validate};
pub use crate::core::request::{ApiRequest, ClientConfig, IntoApiRequest, MessagesClient};
pub use anthropic_types_macros::{api_enum, record, union};

#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use serde_json;
}
