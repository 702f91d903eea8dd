use schemars::{JsonSchema, schema_for};
use serde_json::Value;

use super::content::CacheControl;
use crate::core::error::DataError;
use crate::core::record::Record;
use crate::{record, union};

/// A client-side tool the model may call.
#[record]
pub struct Tool {
    pub name: String,
    pub description: Option<String>,
    /// JSON Schema for the tool input. Must describe an object.
    pub input_schema: Value,
    pub cache_control: Option<CacheControl>,
}

impl Tool {
    pub fn new(name: impl Into<String>, input_schema: Value) -> Self {
        let mut tool = Self::default();
        let record = tool.record_mut();
        record.insert_raw("name", Value::String(name.into()));
        record.insert_raw("input_schema", input_schema);
        tool
    }

    /// Build a tool whose input schema is generated from `T`.
    pub fn for_input<T: JsonSchema>(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, DataError> {
        let mut schema = serde_json::to_value(schema_for!(T))?;
        if let Some(object) = schema.as_object_mut() {
            object.shift_remove("$schema");
            object.shift_remove("title");
        }
        if schema.get("type").and_then(Value::as_str) != Some("object") {
            return Err(DataError::TagMismatch {
                expected: "object",
                found: schema
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("none")
                    .to_string(),
            });
        }

        let mut tool = Self::new(name, schema);
        tool.set_description(description.into())?;
        Ok(tool)
    }
}

/// Anthropic-hosted web search.
#[record(tag = "web_search_20250305")]
pub struct WebSearchTool {
    /// Always `web_search`.
    pub name: String,
    pub max_uses: Option<u32>,
    pub allowed_domains: Option<Vec<String>>,
    pub blocked_domains: Option<Vec<String>>,
    pub cache_control: Option<CacheControl>,
}

impl WebSearchTool {
    pub fn new() -> Self {
        let mut tool = Self::default();
        tool.record_mut()
            .insert_raw("name", Value::String("web_search".to_string()));
        tool
    }
}

/// Entry of the `tools` request list.
///
/// Client tools carry no reliable `type`, so server tools are recognised by
/// their tag first and everything else is taken as a client tool.
#[union(ordered)]
pub enum ToolDefinition {
    WebSearch(WebSearchTool),
    Custom(Tool),
}

#[record(tag = "auto")]
pub struct ToolChoiceAuto {
    pub disable_parallel_tool_use: Option<bool>,
}

#[record(tag = "any")]
pub struct ToolChoiceAny {
    pub disable_parallel_tool_use: Option<bool>,
}

#[record(tag = "tool")]
pub struct ToolChoiceTool {
    pub name: String,
    pub disable_parallel_tool_use: Option<bool>,
}

#[record(tag = "none")]
pub struct ToolChoiceNone {}

/// How the model should pick tools.
#[union(closed)]
pub enum ToolChoice {
    #[variant(tag = "auto")]
    Auto(ToolChoiceAuto),
    #[variant(tag = "any")]
    Any(ToolChoiceAny),
    #[variant(tag = "tool")]
    Tool(ToolChoiceTool),
    #[variant(tag = "none")]
    None(ToolChoiceNone),
}

impl ToolChoice {
    pub fn auto() -> Self {
        Self::Auto(ToolChoiceAuto::default())
    }

    pub fn any() -> Self {
        Self::Any(ToolChoiceAny::default())
    }

    pub fn none() -> Self {
        Self::None(ToolChoiceNone::default())
    }

    pub fn tool(name: impl Into<String>) -> Self {
        let mut choice = ToolChoiceTool::default();
        choice
            .record_mut()
            .insert_raw("name", Value::String(name.into()));
        Self::Tool(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::Validate;
    use serde_json::json;

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct WeatherInput {
        /// City to look up
        city: String,
        days: Option<u8>,
    }

    #[test]
    fn schema_is_generated_from_the_input_type() {
        let tool = Tool::for_input::<WeatherInput>("get_weather", "Look up a forecast").unwrap();
        let schema = tool.input_schema().unwrap();

        assert_eq!(schema["type"], "object");
        assert!(schema.get("$schema").is_none());
        assert_eq!(schema["required"], json!(["city"]));
        assert_eq!(tool.description().unwrap().as_deref(), Some("Look up a forecast"));
        assert!(tool.validate().is_ok());
    }

    #[test]
    fn non_object_inputs_are_refused() {
        assert!(Tool::for_input::<String>("echo", "Echo").is_err());
    }

    #[test]
    fn tool_choice_is_strict() {
        let choice: ToolChoice =
            serde_json::from_value(json!({ "type": "tool", "name": "get_weather" })).unwrap();
        assert_eq!(choice.as_tool().unwrap().name().unwrap(), "get_weather");

        let err = serde_json::from_value::<ToolChoice>(json!({ "type": "tool" })).unwrap_err();
        assert!(err.to_string().contains("missing required field `name`"));

        let err = ToolChoice::decode(json!({ "type": "sometimes" })).unwrap_err();
        assert!(matches!(
            err,
            DataError::NoMatchingVariant { union: "ToolChoice", .. }
        ));
    }

    #[test]
    fn tool_definitions_tell_server_tools_apart() {
        let tools: Vec<ToolDefinition> = serde_json::from_value(json!([
            { "type": "web_search_20250305", "name": "web_search", "max_uses": 3 },
            { "name": "get_weather", "input_schema": { "type": "object" } }
        ]))
        .unwrap();

        assert_eq!(tools[0].as_web_search().unwrap().max_uses().unwrap(), Some(3));
        assert_eq!(tools[1].as_custom().unwrap().name().unwrap(), "get_weather");
    }

    #[test]
    fn constructors_write_the_tag() {
        assert_eq!(
            serde_json::to_string(&ToolChoice::tool("lookup")).unwrap(),
            r#"{"type":"tool","name":"lookup"}"#
        );
        assert_eq!(serde_json::to_string(&ToolChoice::auto()).unwrap(), r#"{"type":"auto"}"#);
    }
}
