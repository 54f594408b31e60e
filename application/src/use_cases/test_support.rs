//! Test doubles shared by the use case tests.

use async_trait::async_trait;
use chatloop_domain::{
    CompletionRequest, CompletionResponse, ConversationKey, EventKind, Message, ProgressEnvelope,
    ProviderError, ToolDescriptor, ToolProvider, Transport,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::ports::cache_store::CacheStore;
use crate::ports::clock::Clock;
use crate::ports::completion_client::{CompletionClient, CompletionError};
use crate::ports::progress::ProgressNotifier;
use crate::ports::session_store::{SessionStore, SessionStoreError};

// ==================== Completion ====================

/// A scripted response for the mock completion client
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    /// Plain assistant text
    Text(String),
    /// Assistant turn requesting `(name, arguments)` calls
    ToolCalls(Vec<(String, Value)>),
    /// Arbitrary response body
    Body(Value),
    Error(CompletionError),
}

impl Scripted {
    pub(crate) fn text(text: &str) -> Self {
        Scripted::Text(text.to_string())
    }

    pub(crate) fn call(name: &str, arguments: Value) -> Self {
        Scripted::ToolCalls(vec![(name.to_string(), arguments)])
    }
}

/// Completion client that returns scripted responses in order and records
/// every request it receives.
#[derive(Default)]
pub(crate) struct ScriptedCompletion {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>,
    next_call_id: AtomicUsize,
}

impl ScriptedCompletion {
    pub(crate) fn new(responses: Vec<Scripted>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn tool_calls_body(&self, calls: &[(String, Value)]) -> Value {
        let entries: Vec<Value> = calls
            .iter()
            .map(|(name, arguments)| {
                let n = self.next_call_id.fetch_add(1, Ordering::SeqCst);
                json!({
                    "id": format!("call_{}", n),
                    "type": "function",
                    "function": {"name": name, "arguments": arguments.to_string()}
                })
            })
            .collect();
        json!({
            "id": "chatcmpl-scripted",
            "choices": [{
                "message": {"role": "assistant", "content": null, "tool_calls": entries},
                "finish_reason": "tool_calls"
            }]
        })
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Text(text)) => Ok(CompletionResponse::from_text(text)),
            Some(Scripted::ToolCalls(calls)) => {
                CompletionResponse::from_body(self.tool_calls_body(&calls))
                    .map_err(|e| CompletionError::Parse(e.to_string()))
            }
            Some(Scripted::Body(body)) => {
                CompletionResponse::from_body(body).map_err(|e| CompletionError::Parse(e.to_string()))
            }
            Some(Scripted::Error(err)) => Err(err),
            None => Ok(CompletionResponse::from_text("(no more responses)")),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, CompletionError> {
        Ok(vec!["scripted".to_string()])
    }
}

// ==================== Tools ====================

/// Tool provider with a fixed tool list that echoes its arguments back.
pub(crate) struct StaticProvider {
    id: String,
    transport: Transport,
    tools: Vec<String>,
    fail_listing: bool,
    failing_tools: HashSet<String>,
    list_calls: AtomicUsize,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl StaticProvider {
    pub(crate) fn new(id: &str, transport: Transport, tools: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            transport,
            tools: tools.iter().map(|t| t.to_string()).collect(),
            fail_listing: false,
            failing_tools: HashSet::new(),
            list_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose listing always fails.
    pub(crate) fn failing(id: &str, transport: Transport) -> Self {
        Self {
            fail_listing: true,
            ..Self::new(id, transport, &[])
        }
    }

    pub(crate) fn with_failing_tool(mut self, name: &str) -> Self {
        self.failing_tools.insert(name.to_string());
        self
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// `(original_name, arguments)` of every executed call, in order.
    pub(crate) fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolProvider for StaticProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn transport(&self) -> Transport {
        self.transport
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(ProviderError::Unreachable("connection refused".into()));
        }
        Ok(self
            .tools
            .iter()
            .map(|name| {
                ToolDescriptor::new(name.clone()).with_input_schema(json!({
                    "type": "object",
                    "properties": {"limit": {"type": "integer"}},
                    "required": ["limit"]
                }))
            })
            .collect())
    }

    async fn call_tool(
        &self,
        original_name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Value, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((original_name.to_string(), arguments.clone()));
        if self.failing_tools.contains(original_name) {
            return Err(ProviderError::BadStatus {
                status: 500,
                body: "boom".into(),
            });
        }
        if !self.tools.iter().any(|t| t == original_name) {
            return Err(ProviderError::UnknownTool(original_name.to_string()));
        }
        Ok(json!({"tool": original_name, "arguments": arguments}))
    }
}

// ==================== Stores ====================

/// Cache without expiry that remembers the TTL of each entry.
#[derive(Default)]
pub(crate) struct MemoryCache {
    entries: Mutex<HashMap<String, (Value, Duration)>>,
}

impl MemoryCache {
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub(crate) fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone())
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) {
        self.entries.lock().unwrap().insert(key.to_string(), (value, ttl));
    }

    async fn forget(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

#[derive(Default)]
pub(crate) struct MemorySessions {
    histories: Mutex<HashMap<ConversationKey, Vec<Message>>>,
    fail_get: bool,
    puts: AtomicUsize,
}

impl MemorySessions {
    pub(crate) fn failing() -> Self {
        Self {
            fail_get: true,
            ..Default::default()
        }
    }

    pub(crate) fn with_history(key: &ConversationKey, messages: Vec<Message>) -> Self {
        let sessions = Self::default();
        sessions.histories.lock().unwrap().insert(key.clone(), messages);
        sessions
    }

    pub(crate) fn stored(&self, key: &ConversationKey) -> Option<Vec<Message>> {
        self.histories.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn get(&self, key: &ConversationKey) -> Result<Vec<Message>, SessionStoreError> {
        if self.fail_get {
            return Err(SessionStoreError::Storage("disk on fire".into()));
        }
        Ok(self.stored(key).unwrap_or_default())
    }

    async fn put(&self, key: &ConversationKey, messages: Vec<Message>) -> Result<(), SessionStoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.histories.lock().unwrap().insert(key.clone(), messages);
        Ok(())
    }

    async fn clear(&self, key: &ConversationKey) -> Result<(), SessionStoreError> {
        self.histories.lock().unwrap().remove(key);
        Ok(())
    }
}

// ==================== Progress / Clock ====================

#[derive(Default)]
pub(crate) struct RecordingProgress {
    envelopes: Mutex<Vec<ProgressEnvelope>>,
}

impl RecordingProgress {
    pub(crate) fn kinds(&self) -> Vec<EventKind> {
        self.envelopes.lock().unwrap().iter().map(|e| e.kind()).collect()
    }

    pub(crate) fn envelopes(&self) -> Vec<ProgressEnvelope> {
        self.envelopes.lock().unwrap().clone()
    }

    /// JSON of the last event of `kind`.
    pub(crate) fn last(&self, kind: EventKind) -> Option<Value> {
        self.envelopes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|e| e.kind() == kind)
            .map(|e| e.to_json())
    }
}

impl ProgressNotifier for RecordingProgress {
    fn emit(&self, envelope: &ProgressEnvelope) {
        self.envelopes.lock().unwrap().push(envelope.clone());
    }
}

pub(crate) struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
