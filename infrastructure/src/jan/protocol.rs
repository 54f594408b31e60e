//! Wire format of the OpenAI-compatible chat completions API.
//!
//! Request body sent to `POST /v1/chat/completions`:
//!
//! ```text
//! {
//!   "model": "...", "max_tokens": 4096, "temperature": 0.7, "stream": false,
//!   "messages": [{"role": "system", "content": "..."}, ...],
//!   "tools": [{"type": "function", "function": {...}}],   // only with tools
//!   "tool_choice": "auto", "parallel_tool_calls": false    // only with tools
//! }
//! ```

use chatloop_domain::{CompletionRequest, ToolDefinition};
use serde_json::{Map, Value, json};

/// Values used for options a request leaves unset.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDefaults {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Build the JSON body for a completion request.
///
/// Precedence per option: typed request option, then the same key among
/// the request's extra parameters, then the provider default.
pub fn build_body(request: &CompletionRequest, defaults: &ProviderDefaults) -> Value {
    let options = &request.options;
    let mut body: Map<String, Value> = options.extra.clone();

    let mut set = |key: &str, typed: Option<Value>, fallback: Value| {
        let value = typed
            .or_else(|| body.get(key).filter(|v| !v.is_null()).cloned())
            .unwrap_or(fallback);
        body.insert(key.to_string(), value);
    };
    set("model", options.model.clone().map(Value::from), json!(defaults.model));
    set("max_tokens", options.max_tokens.map(Value::from), json!(defaults.max_tokens));
    set(
        "temperature",
        options.temperature.map(Value::from),
        json!(defaults.temperature),
    );

    body.insert("stream".to_string(), Value::Bool(false));
    body.insert("messages".to_string(), json!(request.messages));

    if request.has_tools() {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(ToolDefinition::to_function_schema)
            .collect();
        body.insert("tools".to_string(), Value::Array(tools));
        body.insert("tool_choice".to_string(), json!("auto"));
        body.insert("parallel_tool_calls".to_string(), Value::Bool(false));
    } else {
        body.remove("tools");
        body.remove("tool_choice");
        body.remove("parallel_tool_calls");
    }

    Value::Object(body)
}

/// Model ids listed by `GET /v1/models` (`{"data": [{"id": ...}]}`).
pub fn parse_models(body: &Value) -> Vec<String> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
