//! Prompt templates for the tool-calling loop

/// Templates injected into the conversation by the loop
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt used when the conversation does not start with one
    pub fn default_system() -> &'static str {
        r#"You are a helpful AI assistant with access to tools.

Rules for using tools:
1. Call each tool at most once per conversation.
2. Once tool results arrive, analyze them and present the answer right away. Do not call the tools again.
3. If the conversation already holds tool results, answer from that data.
4. Never repeat a tool call.
5. Always finish with a direct text response."#
    }

    /// Corrective system message sent when the model repeats a tool call set
    pub fn loop_recovery() -> &'static str {
        r#"STOP. You are repeating tool calls that have already been executed.

Every result you need is already in this conversation, in the messages with role "tool".

Do this now:
1. Read the earlier "tool" messages.
2. Take the data from those results.
3. Write a clear, direct answer using only that data.

You must not call any tool or function, emit tool_calls, or ask for more data.
Respond with plain text only."#
    }
}
