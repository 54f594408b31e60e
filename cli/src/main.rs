//! CLI entrypoint for chatloop
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use chatloop_application::{
    ChatError, ChatJobRunner, ChatRequest, ChatService, CompletionClient, CompositeProgressNotifier,
    OrchestrationLoop, ProgressNotifier, SessionStore, ToolCatalog,
};
use chatloop_domain::{CompletionOptions, ConversationKey, EventKind, ProgressEnvelope};
use chatloop_infrastructure::config::{catalog_policy, expand_home};
use chatloop_infrastructure::{
    BuiltinState, ConfigLoader, EventHub, FileConfig, InMemorySessionStore, JanCompletionClient,
    JanSettings, JsonFileSessionStore, JsonlEventLogger, MemoryCacheStore, QueueSettings,
    TokioJobQueue, build_providers,
};
use chatloop_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress, follow_run,
};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_FILE_PREFIX: &str = "chatloop.log";
const DEFAULT_EVENTS_FILE: &str = "events.jsonl";

/// Event sink for background runs: broadcast plus optional JSONL log.
struct WorkerEvents {
    hub: Arc<EventHub>,
    log: Option<Arc<JsonlEventLogger>>,
}

impl ProgressNotifier for WorkerEvents {
    fn emit(&self, envelope: &ProgressEnvelope) {
        self.hub.emit(envelope);
        if let Some(log) = &self.log {
            log.emit(envelope);
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{}", line);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?
    };

    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| config.logging.dir.clone())
        .map(|dir| expand_home(&dir));
    let _log_guard = init_tracing(cli.verbose, log_dir.as_ref())?;

    info!("Starting chatloop");
    for issue in config.validate() {
        warn!("{}", issue);
    }

    // === Dependency Injection ===
    let completion: Arc<dyn CompletionClient> = Arc::new(
        JanCompletionClient::new(JanSettings::from_config(&config)).context("Could not set up the completion client")?,
    );

    if cli.health {
        return health(completion.as_ref(), &config, cli.output).await;
    }

    let providers = build_providers(&config, &BuiltinState::default());
    let catalog = Arc::new(ToolCatalog::new(
        providers,
        Arc::new(MemoryCacheStore::new()),
        catalog_policy(&config.cache, &config.error_handling),
    ));

    let sessions: Arc<dyn SessionStore> = match &config.session.dir {
        Some(dir) => Arc::new(JsonFileSessionStore::new(expand_home(dir))),
        None => Arc::new(InMemorySessionStore::new()),
    };

    let (params, _) = config.agent.to_execution_params();
    let orchestrator = Arc::new(OrchestrationLoop::new(completion, catalog.clone(), sessions).with_params(params));

    let event_log = log_dir.as_ref().and_then(|dir| {
        let file = config
            .logging
            .events_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EVENTS_FILE));
        JsonlEventLogger::new(dir.join(file)).map(Arc::new)
    });

    let hub = Arc::new(EventHub::new());
    let runner = ChatJobRunner::new(
        orchestrator.clone(),
        Arc::new(WorkerEvents {
            hub: hub.clone(),
            log: event_log.clone(),
        }),
    );
    let queue_settings = QueueSettings::from_config(&config.queue);
    let queue = Arc::new(TokioJobQueue::start(Arc::new(runner), queue_settings));
    let service = Arc::new(ChatService::new(orchestrator).with_queue(queue.clone()));

    if cli.refresh_tools {
        catalog.invalidate().await;
    }

    if cli.list_tools {
        let tools = catalog.list_all().await.context("Could not list tools")?;
        match cli.output {
            OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&json!(tools))),
            OutputFormat::Text => print!("{}", ConsoleFormatter::format_tools(&tools)),
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut options = CompletionOptions::default();
    if let Some(model) = &cli.model {
        options = options.with_model(model.clone());
    }

    // Chat mode
    if cli.chat {
        let mut repl = ChatRepl::new(service, cli.user.clone())
            .with_conversation(cli.conversation.clone())
            .with_system_prompt(cli.system.clone())
            .with_options(options)
            .with_progress(!cli.quiet)
            .with_subscriber(hub.clone(), queue_settings.timeout * queue_settings.tries);

        repl.run().await?;
        queue.shutdown().await;
        return Ok(ExitCode::SUCCESS);
    }

    // Single message mode - message is required
    let message = match cli.message.clone() {
        Some(m) => m,
        None => bail!("Message is required. Use --chat for interactive mode."),
    };

    // Log lines on stderr would tear through a spinner
    let reporter = ProgressReporter::new();
    let plain = SimpleProgress;
    let mut progress = CompositeProgressNotifier::new(Vec::new());
    if !cli.quiet && cli.output == OutputFormat::Text {
        if cli.verbose > 0 {
            progress.push(&plain);
        } else {
            progress.push(&reporter);
        }
    }

    let code = if cli.run_async {
        // The channel has to be known before dispatch to subscribe in time
        let conversation = cli
            .conversation
            .clone()
            .filter(|c| !c.trim().is_empty() && c != "default")
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let request = ChatRequest::new(cli.user.clone(), message)
            .with_conversation(conversation)
            .with_system_prompt(cli.system.clone())
            .with_options(options);
        run_queued(&service, &hub, request, &progress, &cli, queue_settings).await
    } else {
        if let Some(log) = &event_log {
            progress.push(log.as_ref());
        }
        let mut request = ChatRequest::new(cli.user.clone(), message)
            .with_system_prompt(cli.system.clone())
            .with_options(options);
        if let Some(conversation) = &cli.conversation {
            request = request.with_conversation(conversation.clone());
        }
        run_inline(&service, request, &progress, cli.output).await
    };

    queue.shutdown().await;
    Ok(code)
}

fn init_tracing(verbose: u8, log_dir: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    // Initialize logging based on verbosity level
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry().with(filter).with(stderr).init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir).with_context(|| format!("Could not create log directory {}", dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .init();
    Ok(Some(guard))
}

async fn health(completion: &dyn CompletionClient, config: &FileConfig, output: OutputFormat) -> Result<ExitCode> {
    let url = config.jan_url();
    let models = completion.list_models().await;
    let healthy = models.is_ok();

    match output {
        OutputFormat::Json => {
            let payload = match &models {
                Ok(models) => json!({"healthy": true, "url": url, "models": models}),
                Err(e) => json!({"healthy": false, "url": url, "error": e.to_string()}),
            };
            println!("{}", ConsoleFormatter::format_json(&payload));
        }
        OutputFormat::Text => match &models {
            Ok(models) => println!("{} is reachable, {} model(s): {}", url, models.len(), models.join(", ")),
            Err(e) => println!("{} is not reachable: {}", url, e),
        },
    }

    Ok(if healthy { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn report_error(error: &ChatError, output: OutputFormat) -> ExitCode {
    match output {
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&error.to_payload())),
        OutputFormat::Text => eprintln!("{}", ConsoleFormatter::format_error(error)),
    }
    ExitCode::FAILURE
}

async fn run_inline(
    service: &ChatService,
    request: ChatRequest,
    progress: &dyn ProgressNotifier,
    output: OutputFormat,
) -> ExitCode {
    let token = CancellationToken::new();
    let watcher = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    };

    let result = service.send_sync(request, progress, Some(token)).await;
    watcher.abort();

    match result {
        Ok(reply) => {
            match output {
                OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&reply.to_json())),
                OutputFormat::Text => print!("{}", ConsoleFormatter::format_reply(&reply)),
            }
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e, output),
    }
}

async fn run_queued(
    service: &ChatService,
    hub: &EventHub,
    request: ChatRequest,
    progress: &dyn ProgressNotifier,
    cli: &Cli,
    settings: QueueSettings,
) -> ExitCode {
    let Some(conversation) = request.conversation_id.clone() else {
        return ExitCode::FAILURE;
    };
    let mut rx = hub.subscribe(&ConversationKey::new(request.user_id.clone(), conversation).channel());

    let accepted = match service.dispatch_async(request).await {
        Ok(accepted) => accepted,
        Err(e) => return report_error(&e, cli.output),
    };
    match cli.output {
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&accepted.to_json())),
        OutputFormat::Text if !cli.quiet => eprintln!("{}", ConsoleFormatter::format_accepted(&accepted)),
        OutputFormat::Text => {}
    }

    let last = match follow_run(&mut rx, progress, settings.timeout * settings.tries).await {
        Ok(last) => last,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let failed = last.kind() == EventKind::Failed;
    match cli.output {
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&last.to_json())),
        OutputFormat::Text => {
            let text = ConsoleFormatter::terminal_text(&last).unwrap_or_default();
            if failed {
                eprintln!("Error: {}", text);
            } else {
                println!("{}", text.trim_end());
            }
        }
    }
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
