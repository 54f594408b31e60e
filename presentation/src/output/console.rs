//! Console output formatter for chat results

use chatloop_application::{Accepted, ChatError, SyncReply};
use chatloop_domain::{CompletionResponse, ProgressEnvelope, ProgressEvent, RunMetrics, ToolDefinition};
use colored::Colorize;
use serde_json::Value;

/// Formats replies, errors and listings for terminal display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Reply text followed by a dimmed metrics line
    pub fn format_reply(reply: &SyncReply) -> String {
        format!(
            "{}\n\n{}\n",
            reply.reply.trim_end(),
            Self::metrics_line(&reply.conversation_id, &reply.metrics).dimmed()
        )
    }

    pub fn metrics_line(conversation_id: &str, metrics: &RunMetrics) -> String {
        format!(
            "conversation {} | {} iteration{} | {:.2}s | {} messages",
            conversation_id,
            metrics.iterations,
            if metrics.iterations == 1 { "" } else { "s" },
            metrics.duration_seconds,
            metrics.message_count
        )
    }

    pub fn format_error(error: &ChatError) -> String {
        format!("{} {}", "Error:".red().bold(), error)
    }

    pub fn format_accepted(accepted: &Accepted) -> String {
        format!(
            "{} job {} on {}",
            "Queued".cyan().bold(),
            accepted.job_id,
            accepted.channel.dimmed()
        )
    }

    /// Format as JSON
    pub fn format_json(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn format_tools(tools: &[ToolDefinition]) -> String {
        if tools.is_empty() {
            return "No tools available.\n".to_string();
        }

        let mut output = format!("{}\n", format!("Available tools ({})", tools.len()).cyan().bold());
        for tool in tools {
            let server = tool
                .route
                .as_ref()
                .map(|r| format!("{} via {}", r.server_id, r.transport))
                .unwrap_or_default();
            output.push_str(&format!("\n  {} {}\n", tool.name.bold(), format!("({})", server).dimmed()));
            output.push_str(&Self::indent(&tool.description, "    "));
            output.push('\n');

            let required = Self::required_params(&tool.parameters);
            if let Some(props) = tool.parameters.get("properties").and_then(Value::as_object)
                && !props.is_empty()
            {
                let params: Vec<String> = props
                    .keys()
                    .map(|k| if required.contains(&k.as_str()) { format!("{}*", k) } else { k.clone() })
                    .collect();
                output.push_str(&format!("    {} {}\n", "params:".dimmed(), params.join(", ")));
            }
        }
        output
    }

    fn required_params(schema: &Value) -> Vec<&str> {
        schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Final answer carried by a terminal event, if any
    pub fn terminal_text(envelope: &ProgressEnvelope) -> Option<String> {
        match &envelope.event {
            ProgressEvent::Completed { response, .. } => CompletionResponse::from_body(response.clone())
                .ok()
                .map(|r| r.text().to_string()),
            ProgressEvent::Failed { error, .. } => Some(error.clone()),
            _ => None,
        }
    }

    /// One-line rendering of a progress event
    pub fn event_line(envelope: &ProgressEnvelope) -> String {
        match &envelope.event {
            ProgressEvent::Queued { message, .. } => format!("{} {}", "..".cyan(), message),
            ProgressEvent::ApiResponding { iteration, .. } => {
                format!("{} Waiting for the model (iteration {})", "->".cyan(), iteration)
            }
            ProgressEvent::ToolsExecuting { tool_calls, .. } => {
                let names: Vec<&str> = tool_calls.iter().map(|c| c.name.as_str()).collect();
                format!("{} Running {}", "->".cyan(), names.join(", ").bold())
            }
            ProgressEvent::ToolsCompleted { results, .. } => results
                .iter()
                .map(|r| {
                    if r.ok {
                        format!("  {} {}", "v".green(), r.name)
                    } else {
                        format!("  {} {} (failed)", "x".red(), r.name)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            ProgressEvent::Completed { metrics, .. } => format!(
                "{} Done in {} iteration{}",
                "v".green(),
                metrics.iterations,
                if metrics.iterations == 1 { "" } else { "s" }
            ),
            ProgressEvent::Failed { error, .. } => format!("{} {}", "x".red(), error.red()),
        }
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
