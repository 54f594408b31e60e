//! Tool-call set fingerprints used for loop detection.
//!
//! Two signatures are derived from the calls of one assistant turn:
//!
//! - **names**: the tool names, sorted, joined with `,`
//! - **exact**: `[{name, args}, ...]` as canonical JSON, in call order
//!
//! A turn repeats an earlier one if *either* signature was seen before.
//! Name-only repetition counts: a model that re-derives slightly different
//! arguments for a question it already has the answer to is still looping.

use serde::Serialize;
use serde_json::{Value, json};

use super::entities::ToolCall;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CallSignature {
    pub names: String,
    pub exact: String,
}

impl CallSignature {
    pub fn of(calls: &[ToolCall]) -> Self {
        let mut names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();

        // serde_json maps are ordered by key, so the encoding is canonical
        let exact: Vec<Value> = calls
            .iter()
            .map(|c| json!({ "name": c.name, "args": c.arguments.to_value() }))
            .collect();

        Self {
            names: names.join(","),
            exact: Value::Array(exact).to_string(),
        }
    }
}
