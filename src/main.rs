// LogWeave - main.rs
//
// CLI entry point. Handles:
// 1. Argument parsing
// 2. Logging initialisation (debug mode support)
// 3. Session restore/save (filter selections only)
// 4. One-shot rendering, or watch mode with re-render on change

use chrono::{DateTime, Utc};
use clap::Parser;
use directories::ProjectDirs;
use logweave::app::dispatch::{self, Command, DisplayToggle};
use logweave::app::provider::ContentProvider;
use logweave::app::{session, watcher};
use logweave::core::model::LogLevel;
use logweave::util::logging;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Aggregate a workspace of log and HAR files into one filterable
/// chronological document.
#[derive(Parser, Debug)]
#[command(name = "logweave", version, about)]
struct Cli {
    /// Workspace folder to aggregate.
    workspace: PathBuf,

    /// Keyword to require (raw regex fragment, repeatable, OR'd together).
    #[arg(short, long)]
    keyword: Vec<String>,

    /// Log level to exclude (debug|info|warning|error, repeatable).
    #[arg(long, value_name = "LEVEL")]
    disable_level: Vec<String>,

    /// Lower time bound, RFC 3339 (e.g. 2024-02-08T12:00:00Z).
    #[arg(long)]
    from: Option<String>,

    /// Upper time bound, RFC 3339.
    #[arg(long)]
    till: Option<String>,

    /// Anchor the time window on the earliest occurrence of this id.
    #[arg(long)]
    session_id: Option<String>,

    /// Use per-source emoji prefixes instead of padded service names.
    #[arg(long)]
    emoji: bool,

    /// Append an inline [HH:MM:SS.mmm] time to each line.
    #[arg(long)]
    inline_dates: bool,

    /// Prefix each parsed line with a zero-padded sequence number.
    #[arg(long)]
    sequence_numbers: bool,

    /// Replace GUIDs in the output with a placeholder token.
    #[arg(long)]
    scrub_guids: bool,

    /// Keep running and re-render whenever workspace files change.
    #[arg(long)]
    watch: bool,

    /// Skip loading and saving the persisted filter selections.
    #[arg(long)]
    no_session: bool,

    /// Write the rendered document to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides this).
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let session_file = if cli.no_session {
        None
    } else {
        ProjectDirs::from("com", "logweave", "logweave")
            .map(|dirs| session::session_path(dirs.data_dir()))
    };

    let mut provider = ContentProvider::new(cli.workspace.clone());

    // Restore persisted selections first so CLI flags layer on top.
    if let Some(path) = session_file.as_deref() {
        if let Some(data) = session::load(path) {
            provider.filter = data.filter.into_state();
            provider.display = data.display;
        }
    }

    if let Err(msg) = apply_cli_filters(&mut provider, &cli) {
        eprintln!("logweave: {msg}");
        return ExitCode::FAILURE;
    }

    let cancel = Arc::new(AtomicBool::new(false));

    let result = if cli.watch {
        run_watch(&mut provider, &cli, &cancel)
    } else {
        run_once(&mut provider, &cli, &cancel)
    };

    if let Some(path) = session_file.as_deref() {
        let data = session::SessionData {
            version: session::SESSION_VERSION,
            workspace_root: Some(cli.workspace.clone()),
            filter: session::PersistedFilter::from_state(&provider.filter),
            display: provider.display,
        };
        if let Err(e) = session::save(&data, path) {
            tracing::warn!(error = %e, "Could not save session");
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("logweave: {msg}");
            ExitCode::FAILURE
        }
    }
}

/// Translate CLI flags into dispatch commands on top of any restored state.
fn apply_cli_filters(provider: &mut ContentProvider, cli: &Cli) -> Result<(), String> {
    for keyword in &cli.keyword {
        dispatch::dispatch(provider, Command::ToggleKeyword(keyword.clone()));
    }

    for raw in &cli.disable_level {
        let level = parse_level(raw).ok_or_else(|| format!("unknown log level '{raw}'"))?;
        if !provider.filter.disabled_levels.contains(&level) {
            dispatch::dispatch(provider, Command::ToggleLogLevel(level));
        }
    }

    if cli.from.is_some() || cli.till.is_some() {
        let from = cli.from.as_deref().map(parse_time).transpose()?;
        let till = cli.till.as_deref().map(parse_time).transpose()?;
        dispatch::dispatch(provider, Command::SetTimeRange { from, till });
    }

    if cli.emoji && provider.display.file_names {
        dispatch::dispatch(provider, Command::ToggleDisplay(DisplayToggle::FileNames));
    }
    if cli.inline_dates != provider.display.inline_dates {
        dispatch::dispatch(provider, Command::ToggleDisplay(DisplayToggle::InlineDates));
    }
    if cli.sequence_numbers != provider.display.sequence_numbers {
        dispatch::dispatch(
            provider,
            Command::ToggleDisplay(DisplayToggle::SequenceNumbers),
        );
    }
    if cli.scrub_guids != provider.display.scrub_guids {
        dispatch::dispatch(provider, Command::ToggleDisplay(DisplayToggle::ScrubGuids));
    }

    Ok(())
}

fn parse_level(raw: &str) -> Option<LogLevel> {
    match raw.to_ascii_lowercase().as_str() {
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warning" | "warn" => Some(LogLevel::Warning),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
}

/// Render once and emit the document.
fn run_once(
    provider: &mut ContentProvider,
    cli: &Cli,
    cancel: &AtomicBool,
) -> Result<(), String> {
    let content = generate(provider, cli, cancel)?;
    emit(&content, cli)
}

/// Render, then keep re-rendering whenever the watcher reports a change.
/// Runs until the process is terminated.
fn run_watch(
    provider: &mut ContentProvider,
    cli: &Cli,
    cancel: &Arc<AtomicBool>,
) -> Result<(), String> {
    let content = generate(provider, cli, cancel)?;
    emit(&content, cli)?;

    let (handle, rx) = watcher::watch(cli.workspace.clone(), Arc::clone(cancel));
    tracing::info!(workspace = %cli.workspace.display(), "Watching for changes");

    loop {
        match rx.recv() {
            Ok(event) => {
                provider.on_watch_event(&event);
                // Coalesce the burst that a multi-file change produces.
                while let Ok(more) = rx.recv_timeout(Duration::from_millis(200)) {
                    provider.on_watch_event(&more);
                }
                match generate(provider, cli, cancel) {
                    Ok(content) => emit(&content, cli)?,
                    Err(msg) => tracing::warn!(error = %msg, "Regeneration failed"),
                }
            }
            Err(_) => break,
        }
    }

    handle.stop();
    Ok(())
}

fn generate(
    provider: &mut ContentProvider,
    cli: &Cli,
    cancel: &AtomicBool,
) -> Result<String, String> {
    let content = provider
        .provide_content(cancel)
        .map_err(|e| e.to_string())?;

    // Session-id anchoring needs parsed entries, so it applies after the
    // first regeneration and triggers a cheap filtered re-render.
    if let Some(session_id) = cli.session_id.as_deref() {
        if provider.filter.session_id.as_deref() != Some(session_id) {
            provider
                .apply_session_id(session_id)
                .map_err(|e| e.to_string())?;
            return provider.provide_content(cancel).map_err(|e| e.to_string());
        }
    }

    for warning in &provider.warnings {
        tracing::warn!(warning = %warning, "Non-fatal issue during aggregation");
    }

    Ok(content)
}

fn emit(content: &str, cli: &Cli) -> Result<(), String> {
    match cli.output.as_deref() {
        Some(path) => std::fs::write(path, content)
            .map_err(|e| format!("cannot write '{}': {e}", path.display())),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}
