//! Tool domain entities

use super::arguments::ToolArguments;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// Description used when a provider leaves it out.
pub const DEFAULT_TOOL_DESCRIPTION: &str = "No description available";

/// How a tool's owning server is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Handler registered in this process
    InProcess,
    /// Server reached over HTTP (`/tools/list`, `/tools/call`)
    RemoteHttp,
}

impl Transport {
    pub fn as_str(&self) -> &str {
        match self {
            Transport::InProcess => "in_process",
            Transport::RemoteHttp => "remote_http",
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Routing metadata that travels with a [`ToolDefinition`].
///
/// Never sent to the model; the invoker uses it to find the owning server
/// and the name that server knows the tool by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRoute {
    pub server_id: String,
    pub original_name: String,
    pub transport: Transport,
}

/// A tool as advertised by its server (`tools/list` entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// Catalog entry for one callable tool.
///
/// `name` is globally unique: `{server_id}_{original_name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON-schema of the arguments object
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<ToolRoute>,
}

impl ToolDefinition {
    /// Public name for a tool served by `server_id`.
    pub fn prefixed_name(server_id: &str, original_name: &str) -> String {
        format!("{}_{}", server_id, original_name)
    }

    /// Empty object schema used when a provider gives none.
    pub fn empty_schema() -> Value {
        json!({ "type": "object", "properties": {} })
    }

    /// Normalize a provider's descriptor into a catalog entry.
    pub fn from_descriptor(server_id: &str, transport: Transport, descriptor: ToolDescriptor) -> Self {
        let description = descriptor
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOOL_DESCRIPTION.to_string());
        Self {
            name: Self::prefixed_name(server_id, &descriptor.name),
            description,
            parameters: descriptor.input_schema.unwrap_or_else(Self::empty_schema),
            route: Some(ToolRoute {
                server_id: server_id.to_string(),
                original_name: descriptor.name,
                transport,
            }),
        }
    }

    /// Function-calling schema offered to the model.
    pub fn to_function_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }

    /// Names in the schema's `required` list that are absent from `arguments`.
    pub fn missing_required(&self, arguments: &ToolArguments) -> Vec<String> {
        let Some(required) = self.parameters.get("required").and_then(Value::as_array) else {
            return Vec::new();
        };
        let map = arguments.as_map();
        required
            .iter()
            .filter_map(Value::as_str)
            .filter(|name| !map.contains_key(*name))
            .map(str::to_string)
            .collect()
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireToolCall", try_from = "WireToolCall")]
pub struct ToolCall {
    /// Correlation id, echoed back as `tool_call_id` on the result message
    pub id: String,
    /// Prefixed tool name
    pub name: String,
    pub arguments: ToolArguments,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Client-side correlation id for calls that arrive without one.
    pub fn generate_id() -> String {
        format!("call_{}", Uuid::new_v4().simple())
    }

    /// Decode one entry of an assistant message's `tool_calls`.
    ///
    /// Returns `None` when no function name can be resolved.
    pub fn from_wire(value: &Value) -> Option<Self> {
        let function = value.get("function")?;
        let name = function
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())?;
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(Self::generate_id);
        let arguments = function
            .get("arguments")
            .map(ToolArguments::from_value)
            .unwrap_or_default();
        Some(Self::new(id, name, arguments))
    }
}

/// OpenAI wire shape: `{id, type: "function", function: {name, arguments}}`,
/// with `arguments` encoded as a JSON string.
#[derive(Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

#[derive(Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn function_kind() -> String {
    "function".to_string()
}

impl From<ToolCall> for WireToolCall {
    fn from(call: ToolCall) -> Self {
        Self {
            id: Some(call.id),
            kind: function_kind(),
            function: WireFunction {
                name: call.name,
                arguments: Value::String(call.arguments.to_wire_string()),
            },
        }
    }
}

impl TryFrom<WireToolCall> for ToolCall {
    type Error = String;

    fn try_from(wire: WireToolCall) -> Result<Self, Self::Error> {
        if wire.function.name.trim().is_empty() {
            return Err("tool call without a function name".to_string());
        }
        Ok(Self {
            id: wire.id.unwrap_or_else(Self::generate_id),
            name: wire.function.name,
            arguments: ToolArguments::from_value(&wire.function.arguments),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn readings_descriptor() -> ToolDescriptor {
        ToolDescriptor::new("readLatest")
            .with_description("Latest sensor readings")
            .with_input_schema(json!({
                "type": "object",
                "properties": {"limit": {"type": "integer"}, "status": {"type": "string"}},
                "required": ["limit"]
            }))
    }

    #[test]
    fn test_from_descriptor_prefixes_name_and_keeps_route() {
        let def = ToolDefinition::from_descriptor("sensor", Transport::InProcess, readings_descriptor());
        assert_eq!(def.name, "sensor_readLatest");
        let route = def.route.unwrap();
        assert_eq!(route.server_id, "sensor");
        assert_eq!(route.original_name, "readLatest");
        assert_eq!(route.transport, Transport::InProcess);
    }

    #[test]
    fn test_from_descriptor_defaults() {
        let def = ToolDefinition::from_descriptor("ops", Transport::RemoteHttp, ToolDescriptor::new("ping"));
        assert_eq!(def.description, DEFAULT_TOOL_DESCRIPTION);
        assert_eq!(def.parameters, ToolDefinition::empty_schema());
    }

    #[test]
    fn test_function_schema_hides_route() {
        let def = ToolDefinition::from_descriptor("sensor", Transport::InProcess, readings_descriptor());
        let schema = def.to_function_schema();
        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "sensor_readLatest");
        assert!(schema["function"].get("route").is_none());
    }

    #[test]
    fn test_missing_required() {
        let def = ToolDefinition::from_descriptor("sensor", Transport::InProcess, readings_descriptor());
        assert_eq!(def.missing_required(&ToolArguments::default()), vec!["limit".to_string()]);
        assert!(def
            .missing_required(&ToolArguments::parse(r#"{"limit": 5}"#))
            .is_empty());
    }

    #[test]
    fn test_from_wire_drops_nameless() {
        assert!(ToolCall::from_wire(&json!({"id": "c1", "function": {"arguments": "{}"}})).is_none());
        assert!(ToolCall::from_wire(&json!({"id": "c1", "function": {"name": "  "}})).is_none());
        assert!(ToolCall::from_wire(&json!({"id": "c1"})).is_none());
    }

    #[test]
    fn test_from_wire_generates_missing_id() {
        let call = ToolCall::from_wire(&json!({"function": {"name": "sensor_readLatest"}})).unwrap();
        assert!(call.id.starts_with("call_"));
        assert_eq!(call.arguments, ToolArguments::default());
    }

    #[test]
    fn test_serde_uses_wire_shape() {
        let call = ToolCall::new("c1", "sensor_readLatest", ToolArguments::parse(r#"{"limit":5}"#));
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(value, json!({
            "id": "c1",
            "type": "function",
            "function": {"name": "sensor_readLatest", "arguments": "{\"limit\":5}"}
        }));
        let back: ToolCall = serde_json::from_value(value).unwrap();
        assert_eq!(back, call);
    }
}
