//! CLI entrypoint for mmagent
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use clap::Parser;
use mmagent_application::{
    ApprovalBroker, AuditLogger, NoAuditLogger, RunContextPropagator, ToolExecutorPort,
};
use mmagent_domain::{Provider, RunContext, ToolCall, ToolStatus};
use mmagent_infrastructure::tools::{
    DELETE_ARTIFACTS, DESCRIBE_IMAGE, EDIT_IMAGE, GENERATE_IMAGE, SYNTHESIZE_SPEECH,
};
use mmagent_infrastructure::{
    ConfigLoader, FileConfig, FileLoggingConfig, FsArtifactStore, HttpMediaDownloader,
    JsonLineLedger, JsonlAuditLogger, MpscApprovalChannel, PortFactory, ToolContext, ToolDeps, default_registry,
};
use mmagent_presentation::{
    Cli, Command, ConsoleApprover, ConsoleFormatter, ProgressReporter, ProviderArg,
    SimpleProgress,
};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Command::Config) {
        ConfigLoader::print_config_sources();
    }

    let mut config =
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow!("Invalid config: {}", e))?;
    config.validate()?;
    apply_overrides(&mut config, &cli);

    let _log_guard = init_logging(cli.verbose, &config.logging);
    info!("Starting mmagent");

    if matches!(cli.command, Command::Config) {
        println!();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    // === Dependency Injection ===
    let client = reqwest::Client::new();
    let ports = Arc::new(PortFactory::new(client.clone(), &config.providers));
    let store = Arc::new(FsArtifactStore::new(&config.workspace.root));

    let audit: Arc<dyn AuditLogger> = match config
        .logging
        .audit_log
        .as_ref()
        .and_then(JsonlAuditLogger::new)
    {
        Some(logger) => Arc::new(logger),
        None => Arc::new(NoAuditLogger),
    };
    let (channel, requests) = MpscApprovalChannel::new();
    let broker = Arc::new(ApprovalBroker::new(
        config.hitl.to_policy(),
        Arc::new(channel),
        audit,
    ));
    let propagator = Arc::new(RunContextPropagator::new());
    let ctx = Arc::new(ToolContext::new(
        broker.clone(),
        propagator.clone(),
        store,
        config.agent.default_session.clone(),
    ));

    let cancel = CancellationToken::new();
    let deps = ToolDeps {
        ctx,
        ports,
        agent: config.agent.clone(),
        poller: config.poller.to_poller_config(),
        retry: config.retry.to_policy(),
        speech: config.speech.clone(),
        downloader: Arc::new(HttpMediaDownloader::new(client)),
        ledger: Arc::new(JsonLineLedger::new(
            &config.workspace.root,
            config.speech.first_line_number,
        )),
        cancel: cancel.clone(),
    };
    let mut registry = default_registry(deps, config.tools.clone());
    registry.build();

    if matches!(cli.command, Command::Tools) {
        print!("{}", ConsoleFormatter::format_tools(&registry.definitions()));
        let stats = registry.stats();
        if !stats.failed.is_empty() {
            println!("Unavailable (check provider keys): {}", stats.failed.join(", "));
        }
        return Ok(());
    }

    let call = tool_call(&cli.command)?;
    if !registry.has_tool(&call.tool_name) {
        let failed = registry.stats().failed.contains(&call.tool_name);
        if failed {
            bail!(
                "{} is unavailable: its provider is not configured (see `mmagent -v tools`)",
                call.tool_name
            );
        }
        bail!("{} is disabled in the [tools] config", call.tool_name);
    }

    // Approvals are answered on the console for the lifetime of the process
    tokio::spawn(
        ConsoleApprover::new(broker.clone())
            .with_auto_approve(cli.yes)
            .run(requests),
    );

    let thread_id = format!("cli-{}", Utc::now().timestamp_millis());
    {
        let cancel = cancel.clone();
        let broker = broker.clone();
        let thread_id = thread_id.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling run");
                cancel.cancel();
                broker.release_run(&thread_id);
            }
        });
    }

    let mut run = RunContext::new(&thread_id);
    if !cli.quiet {
        run = run.with_progress(if console_is_interactive() {
            Arc::new(ProgressReporter::new()).callback()
        } else {
            SimpleProgress::callback()
        });
    }
    let _run_guard = propagator.begin_run(run.clone());
    let result = propagator
        .scope(run, registry.execute(&call, &cancel))
        .await;

    println!();
    print!("{}", ConsoleFormatter::format(&result));

    match result.status {
        ToolStatus::Failure => bail!("{} failed", call.tool_name),
        ToolStatus::Success | ToolStatus::Cancelled => Ok(()),
    }
}

/// Terminal filter from `-v`, plus an optional plain-text log file.
fn init_logging(verbose: u8, logging: &FileLoggingConfig) -> Option<WorkerGuard> {
    let terminal_filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug,hyper=warn,reqwest=warn"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };
    let terminal_layer = fmt::layer().with_target(false);

    let file_writer = logging.file.as_deref().and_then(|path| {
        let file_name = path.file_name()?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        Some(tracing_appender::non_blocking(
            tracing_appender::rolling::never(dir, file_name),
        ))
    });

    match file_writer {
        Some((writer, guard)) => {
            let file_layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(terminal_layer.with_filter(terminal_filter))
                .with(file_layer.with_filter(EnvFilter::new("debug,hyper=warn,reqwest=warn")))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(terminal_layer.with_filter(terminal_filter))
                .init();
            None
        }
    }
}

fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(session) = &cli.session {
        config.agent.default_session = session.clone();
    }
    if let Some(provider) = cli.provider {
        config.agent.multimodal_provider = Some(match provider {
            ProviderArg::Dashscope => Provider::DashScope,
            ProviderArg::Zhipu => Provider::Zhipu,
            ProviderArg::Openai => Provider::OpenAiCompatible,
        });
    }
}

fn console_is_interactive() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}

/// The tool call a subcommand stands for.
fn tool_call(command: &Command) -> Result<ToolCall> {
    let call = match command {
        Command::Image {
            prompt,
            size,
            style,
            negative_prompt,
        } => with_optional(
            ToolCall::new(GENERATE_IMAGE).with_arg("prompt", prompt.as_str()),
            [
                ("size", size),
                ("style", style),
                ("negative_prompt", negative_prompt),
            ],
        ),
        Command::Edit {
            prompt,
            image_paths,
            size,
            model,
        } => with_optional(
            ToolCall::new(EDIT_IMAGE)
                .with_arg("prompt", prompt.as_str())
                .with_arg("imagePaths", json!(image_paths)),
            [("size", size), ("model", model)],
        ),
        Command::Speak {
            texts,
            voice,
            format,
        } => with_optional(
            ToolCall::new(SYNTHESIZE_SPEECH).with_arg("texts", json!(texts)),
            [("voice", voice), ("format", format)],
        ),
        Command::Describe { image_path, prompt } => with_optional(
            ToolCall::new(DESCRIBE_IMAGE).with_arg("imagePath", image_path.as_str()),
            [("userPrompt", prompt)],
        ),
        Command::Delete { category, paths } => {
            let call = ToolCall::new(DELETE_ARTIFACTS).with_arg("category", category.as_str());
            if paths.is_empty() {
                call
            } else {
                call.with_arg("paths", json!(paths))
            }
        }
        Command::Tools | Command::Config => bail!("not a tool command"),
    };
    Ok(call.with_id(format!("call-{}", Utc::now().timestamp_millis())))
}

fn with_optional<const N: usize>(
    call: ToolCall,
    args: [(&str, &Option<String>); N],
) -> ToolCall {
    args.into_iter().fold(call, |call, (key, value)| match value {
        Some(value) => call.with_arg(key, Value::from(value.as_str())),
        None => call,
    })
}
