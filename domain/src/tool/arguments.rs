//! Tool call arguments.
//!
//! Models hand back arguments in whatever shape they like: a JSON object, a
//! string that *contains* a JSON object, an empty string, or garbage. The
//! loop must never stall on a malformed payload, so parsing is total:
//!
//! | Input | Result |
//! |-------|--------|
//! | JSON object | `Parsed(map)` |
//! | string holding a JSON object | `Parsed(map)` |
//! | `null`, `""` or whitespace | `Parsed({})` |
//! | anything else | `ParseFailed { raw }` (behaves as `{}`) |

use serde_json::{Map, Value};
use std::borrow::Cow;

/// Structured arguments of a single tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArguments {
    /// Arguments decoded into a key/value map.
    Parsed(Map<String, Value>),
    /// The model sent something that is not a JSON object.
    ///
    /// The raw text is kept so it can be echoed back verbatim in history,
    /// while dispatch treats the call as having no arguments.
    ParseFailed { raw: String },
}

impl Default for ToolArguments {
    fn default() -> Self {
        Self::Parsed(Map::new())
    }
}

impl ToolArguments {
    /// Parse arguments from raw text.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self::Parsed(map),
            _ => Self::ParseFailed {
                raw: raw.to_string(),
            },
        }
    }

    /// Interpret an `arguments` field as found on the wire.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::Parsed(map.clone()),
            Value::String(raw) => Self::parse(raw),
            Value::Null => Self::default(),
            other => Self::ParseFailed {
                raw: other.to_string(),
            },
        }
    }

    /// The argument map; empty when parsing failed.
    pub fn as_map(&self) -> Cow<'_, Map<String, Value>> {
        match self {
            Self::Parsed(map) => Cow::Borrowed(map),
            Self::ParseFailed { .. } => Cow::Owned(Map::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Parsed(map) => map.get(key),
            Self::ParseFailed { .. } => None,
        }
    }

    pub fn is_parse_failed(&self) -> bool {
        matches!(self, Self::ParseFailed { .. })
    }

    /// Arguments as a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.as_map().into_owned())
    }

    /// Arguments encoded the way the completion endpoint expects them
    /// (a JSON string). Unparseable input is echoed back unchanged.
    pub fn to_wire_string(&self) -> String {
        match self {
            Self::Parsed(map) => Value::Object(map.clone()).to_string(),
            Self::ParseFailed { raw } => raw.clone(),
        }
    }
}

impl From<Map<String, Value>> for ToolArguments {
    fn from(map: Map<String, Value>) -> Self {
        Self::Parsed(map)
    }
}
