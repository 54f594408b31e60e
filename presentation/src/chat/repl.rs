//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleFormatter;
use crate::ProgressReporter;
use crate::progress::follow::follow_run;
use chatloop_application::{ChatRequest, ChatService, NoProgress, ProgressNotifier, ProgressSubscriber};
use chatloop_domain::{CompletionOptions, ConversationKey, EventKind};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Slash commands understood by the REPL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Tools,
    Refresh,
    Clear,
    ToggleAsync,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        match line.split_whitespace().next().unwrap_or(line) {
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/tools" => ReplCommand::Tools,
            "/refresh" => ReplCommand::Refresh,
            "/clear" => ReplCommand::Clear,
            "/async" => ReplCommand::ToggleAsync,
            other => ReplCommand::Unknown(other.to_string()),
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    service: Arc<ChatService>,
    subscriber: Option<Arc<dyn ProgressSubscriber>>,
    user_id: String,
    conversation_id: String,
    system_prompt: Option<String>,
    options: CompletionOptions,
    show_progress: bool,
    async_mode: bool,
    follow_timeout: Duration,
}

impl ChatRepl {
    /// Create a new ChatRepl on a fresh conversation
    pub fn new(service: Arc<ChatService>, user_id: impl Into<String>) -> Self {
        Self {
            service,
            subscriber: None,
            user_id: user_id.into(),
            conversation_id: Uuid::new_v4().to_string(),
            system_prompt: None,
            options: CompletionOptions::default(),
            show_progress: true,
            async_mode: false,
            follow_timeout: Duration::from_secs(600),
        }
    }

    /// Continue an existing conversation instead
    pub fn with_conversation(mut self, conversation_id: Option<String>) -> Self {
        if let Some(id) = conversation_id.filter(|id| !id.trim().is_empty() && id != "default") {
            self.conversation_id = id;
        }
        self
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Enable `/async` by providing an event feed for queued runs
    pub fn with_subscriber(mut self, subscriber: Arc<dyn ProgressSubscriber>, follow_timeout: Duration) -> Self {
        self.subscriber = Some(subscriber);
        self.follow_timeout = follow_timeout;
        self
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    fn key(&self) -> ConversationKey {
        ConversationKey::new(self.user_id.clone(), self.conversation_id.clone())
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        // Try to load history
        let history_path = dirs::data_dir().map(|p| p.join("chatloop").join("history.txt"));

        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            let readline = rl.readline(">>> ");

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }

                    // Handle commands
                    if line.starts_with('/') {
                        if self.handle_command(ReplCommand::parse(line)).await {
                            break;
                        }
                        continue;
                    }

                    // Add to history
                    let _ = rl.add_history_entry(line);

                    self.process_message(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        // Save history
        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│            chatloop - Chat Mode             │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Conversation: {}", self.conversation_id);
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /help, /h, /?    - Show this help");
        println!("  /tools           - List tools offered to the model");
        println!("  /refresh         - Reload the tool list from all servers");
        println!("  /clear           - Forget this conversation's history");
        println!("  /async           - Toggle queued (background) runs");
        println!("  /quit, /exit, /q - Exit chat");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&mut self, command: ReplCommand) -> bool {
        let catalog = self.service.orchestrator().catalog().clone();
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => {
                println!();
                Self::print_help();
            }
            ReplCommand::Tools => match catalog.list_all().await {
                Ok(tools) => println!("\n{}", ConsoleFormatter::format_tools(&tools)),
                Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
            },
            ReplCommand::Refresh => {
                catalog.invalidate().await;
                match catalog.list_all().await {
                    Ok(tools) => println!("Tool list refreshed: {} tools", tools.len()),
                    Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
                }
            }
            ReplCommand::Clear => match self.service.clear(&self.key()).await {
                Ok(()) => println!("History cleared for {}", self.conversation_id),
                Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
            },
            ReplCommand::ToggleAsync => {
                if self.subscriber.is_none() {
                    println!("Background runs are not available in this session");
                } else {
                    self.async_mode = !self.async_mode;
                    println!("Async mode {}", if self.async_mode { "on" } else { "off" });
                }
            }
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
        false
    }

    fn request(&self, message: &str) -> ChatRequest {
        ChatRequest::new(self.user_id.clone(), message)
            .with_conversation(self.conversation_id.clone())
            .with_system_prompt(self.system_prompt.clone())
            .with_options(self.options.clone())
    }

    async fn process_message(&self, message: &str) {
        println!();

        let reporter;
        let progress: &dyn ProgressNotifier = if self.show_progress {
            reporter = ProgressReporter::new();
            &reporter
        } else {
            &NoProgress
        };

        match &self.subscriber {
            Some(subscriber) if self.async_mode => self.process_queued(message, subscriber.as_ref(), progress).await,
            _ => self.process_inline(message, progress).await,
        }
        println!();
    }

    async fn process_inline(&self, message: &str, progress: &dyn ProgressNotifier) {
        let token = CancellationToken::new();
        let watcher = {
            let token = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    token.cancel();
                }
            })
        };

        let result = self.service.send_sync(self.request(message), progress, Some(token)).await;
        watcher.abort();

        match result {
            Ok(reply) => println!("{}", ConsoleFormatter::format_reply(&reply)),
            Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
        }
    }

    async fn process_queued(&self, message: &str, subscriber: &dyn ProgressSubscriber, progress: &dyn ProgressNotifier) {
        let mut rx = subscriber.subscribe(&self.key().channel());

        match self.service.dispatch_async(self.request(message)).await {
            Ok(accepted) => println!("{}", ConsoleFormatter::format_accepted(&accepted)),
            Err(e) => {
                eprintln!("{}", ConsoleFormatter::format_error(&e));
                return;
            }
        }

        match follow_run(&mut rx, progress, self.follow_timeout).await {
            Ok(last) => {
                let text = ConsoleFormatter::terminal_text(&last).unwrap_or_default();
                if last.kind() == EventKind::Failed {
                    eprintln!("{} {}", "Error:".red().bold(), text);
                } else {
                    println!("{}", text.trim_end());
                }
            }
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }
}
