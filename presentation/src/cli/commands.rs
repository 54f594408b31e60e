//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Reply text with a short metrics line
    Text,
    /// Full JSON payload
    Json,
}

/// CLI arguments for chatloop
#[derive(Parser, Debug)]
#[command(name = "chatloop")]
#[command(author, version, about = "Tool-calling chat loop for OpenAI-compatible local models")]
#[command(long_about = r#"
chatloop sends your message to a local OpenAI-compatible model (Jan by
default) and lets the model call tools until it can answer.

Each run:
1. Loads the conversation history and adds your message
2. Asks the model, offering every tool of every configured server
3. Executes the requested tools and feeds the results back
4. Repeats until the model answers in plain text (max 5 rounds by default)

Configuration files are loaded from (in priority order):
1. CHATLOOP_* environment variables (e.g. CHATLOOP_JAN__URL)
2. --config <path>     Explicit config file
3. ./chatloop.toml     Project-level config
4. ~/.config/chatloop/config.toml   Global config

Example:
  chatloop "Show me the latest compressor readings"
  chatloop --conversation plant-1 "Any critical readings this week?"
  chatloop --async "Summarize pressure trends"
  chatloop --chat
"#)]
pub struct Cli {
    /// The message to send (not required in chat mode)
    pub message: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Queue the run and follow its progress events
    #[arg(long = "async")]
    pub run_async: bool,

    /// Conversation to continue (a new one is started when omitted)
    #[arg(long, value_name = "ID")]
    pub conversation: Option<String>,

    /// User the conversation belongs to
    #[arg(long, value_name = "ID", default_value = "cli")]
    pub user: String,

    /// System prompt for a new conversation
    #[arg(long, value_name = "PROMPT")]
    pub system: Option<String>,

    /// Model to request (overrides jan.model)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// List the tools offered to the model and exit
    #[arg(long)]
    pub list_tools: bool,

    /// Drop the cached tool list before running
    #[arg(long)]
    pub refresh_tools: bool,

    /// Check that the completion endpoint answers and exit
    #[arg(long)]
    pub health: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Directory for the log file and the progress event log
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}
