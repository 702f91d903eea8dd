//! Request bodies for the messages endpoints.

use reqwest::Method;

use super::content::SystemPrompt;
use super::message::{Message, MessageParam};
use super::tools::{ToolChoice, ToolDefinition};
use crate::core::error::DataError;
use crate::core::record::Record;
use crate::core::request::{ApiRequest, IntoApiRequest};
use crate::{record, union};

const BETA_HEADER: &str = "anthropic-beta";

#[record]
pub struct Metadata {
    /// Opaque end-user identifier.
    pub user_id: Option<String>,
}

#[record(tag = "enabled")]
pub struct ThinkingEnabled {
    pub budget_tokens: u32,
}

#[record(tag = "disabled")]
pub struct ThinkingDisabled {}

/// Extended thinking switch.
#[union(closed)]
pub enum ThinkingConfig {
    #[variant(tag = "enabled")]
    Enabled(ThinkingEnabled),
    #[variant(tag = "disabled")]
    Disabled(ThinkingDisabled),
}

impl ThinkingConfig {
    pub fn enabled(budget_tokens: u32) -> Result<Self, DataError> {
        let mut enabled = ThinkingEnabled::default();
        enabled.set_budget_tokens(budget_tokens)?;
        Ok(Self::Enabled(enabled))
    }
}

/// Body of `POST /v1/messages`.
///
/// `betas` is not sent in the body; it becomes the `anthropic-beta` header.
#[record]
pub struct MessageCreateParams {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<MessageParam>,
    pub system: Option<SystemPrompt>,
    pub metadata: Option<Metadata>,
    pub stop_sequences: Option<Vec<String>>,
    pub stream: Option<bool>,
    pub temperature: Option<f64>,
    pub top_k: Option<u32>,
    pub top_p: Option<f64>,
    pub thinking: Option<ThinkingConfig>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub tool_choice: Option<ToolChoice>,
    pub betas: Option<Vec<String>>,
}

impl MessageCreateParams {
    pub fn new(
        model: impl Into<String>,
        max_tokens: u32,
        messages: Vec<MessageParam>,
    ) -> Result<Self, DataError> {
        let mut params = Self::default();
        params.set_model(model.into())?;
        params.set_max_tokens(max_tokens)?;
        params.set_messages(messages)?;
        Ok(params)
    }
}

impl IntoApiRequest for MessageCreateParams {
    type Response = Message;

    fn into_api_request(self) -> Result<ApiRequest, DataError> {
        Ok(ApiRequest::new(Method::POST, "/v1/messages")
            .with_body(self.into_record())
            .body_to_header("betas", BETA_HEADER))
    }
}

/// Body of `POST /v1/messages/count_tokens`.
#[record]
pub struct MessageCountTokensParams {
    pub model: String,
    pub messages: Vec<MessageParam>,
    pub system: Option<SystemPrompt>,
    pub thinking: Option<ThinkingConfig>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub tool_choice: Option<ToolChoice>,
    pub betas: Option<Vec<String>>,
}

impl MessageCountTokensParams {
    pub fn new(model: impl Into<String>, messages: Vec<MessageParam>) -> Result<Self, DataError> {
        let mut params = Self::default();
        params.set_model(model.into())?;
        params.set_messages(messages)?;
        Ok(params)
    }
}

impl IntoApiRequest for MessageCountTokensParams {
    type Response = MessageTokensCount;

    fn into_api_request(self) -> Result<ApiRequest, DataError> {
        Ok(ApiRequest::new(Method::POST, "/v1/messages/count_tokens")
            .with_body(self.into_record())
            .body_to_header("betas", BETA_HEADER))
    }
}

#[record]
pub struct MessageTokensCount {
    pub input_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::Validate;
    use crate::messages::content::ContentBlock;

    fn params() -> MessageCreateParams {
        MessageCreateParams::new(
            "claude-sonnet-4-5",
            1024,
            vec![MessageParam::user("Hello").unwrap()],
        )
        .unwrap()
    }

    #[test]
    fn body_keeps_declaration_order() {
        let mut params = params();
        params.set_system("Be brief.").unwrap();

        assert_eq!(
            params.to_json(),
            r#"{"model":"claude-sonnet-4-5","max_tokens":1024,"messages":[{"role":"user","content":"Hello"}],"system":"Be brief."}"#
        );
        assert!(params.validate().is_ok());
    }

    #[test]
    fn betas_travel_as_a_header() {
        let mut params = params();
        params
            .set_betas(vec!["token-efficient-tools-2025-02-19".to_string(), "files-api-2025-04-14".to_string()])
            .unwrap();

        let request = params.into_api_request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/v1/messages");

        let body = request.body.as_ref().unwrap();
        assert!(!body.contains_key("betas"));
        assert_eq!(
            request.header_pairs(),
            vec![(
                "anthropic-beta".to_string(),
                "token-efficient-tools-2025-02-19,files-api-2025-04-14".to_string()
            )]
        );
    }

    #[test]
    fn no_betas_means_no_header() {
        let request = params().into_api_request().unwrap();
        assert!(request.headers.is_empty());
    }

    #[test]
    fn thinking_config_is_strict() {
        let mut params = params();
        params.set_thinking(ThinkingConfig::enabled(2048).unwrap()).unwrap();
        let thinking = params.thinking().unwrap().unwrap();
        assert_eq!(thinking.as_enabled().unwrap().budget_tokens().unwrap(), 2048);

        params
            .record_mut()
            .insert_raw("thinking", serde_json::json!({ "type": "adaptive" }));
        assert!(params.thinking().is_err());
    }

    #[test]
    fn messages_hold_blocks_too() {
        let turn = MessageParam::user(ContentBlock::text("Describe this")).unwrap();
        let params = MessageCountTokensParams::new("claude-sonnet-4-5", vec![turn]).unwrap();
        assert_eq!(
            params.to_json(),
            r#"{"model":"claude-sonnet-4-5","messages":[{"role":"user","content":[{"type":"text","text":"Describe this"}]}]}"#
        );
    }
}
