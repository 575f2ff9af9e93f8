//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Definition of a tool the orchestration engine can call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "generate_image")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// HITL action type gating this tool's side effects, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    /// Parameter specifications
    pub parameters: Vec<ToolParameter>,
}

/// Parameter specification for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    pub required: bool,
    /// Type hint (e.g., "string", "array", "object")
    pub param_type: String,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            action_type: None,
            parameters: Vec::new(),
        }
    }

    pub fn with_action_type(mut self, action_type: impl Into<String>) -> Self {
        self.action_type = Some(action_type.into());
        self
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: "string".to_string(),
        }
    }

    pub fn with_type(mut self, param_type: impl Into<String>) -> Self {
        self.param_type = param_type.into();
        self
    }
}

/// A call to a tool with arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Engine-assigned id of this call; becomes the run context's tool call id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Assistant message that issued the call, when the engine reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            id: None,
            message_id: None,
            tool_name: tool_name.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        self.get_string(key)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// Get a list of strings; non-string items are rejected
    pub fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>, String> {
        match self.arguments.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| format!("Argument {} must contain only strings", key))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(format!("Argument {} must be an array", key)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.arguments.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.arguments.get(key).and_then(|v| v.as_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition() {
        let tool = ToolDefinition::new("generate_image", "Generate an image")
            .with_action_type("ai.text2image")
            .with_parameter(ToolParameter::new("prompt", "Image description", true))
            .with_parameter(ToolParameter::new("size", "Image size", false));

        assert_eq!(tool.name, "generate_image");
        assert_eq!(tool.action_type.as_deref(), Some("ai.text2image"));
        assert_eq!(tool.required_parameters().count(), 1);
    }

    #[test]
    fn test_require_string() {
        let call = ToolCall::new("generate_image")
            .with_arg("prompt", "a cat")
            .with_arg("blank", "  ");

        assert_eq!(call.require_string("prompt"), Ok("a cat"));
        assert!(call.require_string("blank").is_err());
        assert!(call.require_string("missing").is_err());
    }

    #[test]
    fn test_string_list() {
        let call = ToolCall::new("synthesize_speech")
            .with_arg("texts", json!(["hello", "world"]))
            .with_arg("mixed", json!(["a", 1]))
            .with_arg("scalar", "a");

        assert_eq!(
            call.get_string_list("texts").unwrap(),
            Some(vec!["hello".to_string(), "world".to_string()])
        );
        assert_eq!(call.get_string_list("missing").unwrap(), None);
        assert!(call.get_string_list("mixed").is_err());
        assert!(call.get_string_list("scalar").is_err());
    }

    #[test]
    fn test_scalar_accessors() {
        let call = ToolCall::new("edit_image")
            .with_arg("count", 2)
            .with_arg("watermark", true)
            .with_arg("size", "1280*1280");

        assert_eq!(call.get_u64("count"), Some(2));
        assert_eq!(call.get_bool("watermark"), Some(true));
        assert_eq!(call.get_bool("size"), None);
        assert_eq!(call.get_u64("missing"), None);
    }

    #[test]
    fn test_call_deserializes_without_arguments() {
        let call: ToolCall = serde_json::from_str(r#"{"tool_name":"delete_artifacts"}"#).unwrap();
        assert!(call.arguments.is_empty());
        assert!(call.id.is_none());
        assert!(call.message_id.is_none());
    }
}
