//! `tourney` command line
//!
//! Event records go to stdout, diagnostics to stderr.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tourney_core::{
    export_best, export_scoreboard, read_history, ChainExecution, EventEmitter, JsonLinesSink,
    PipelineSettings, Session,
};
use tourney_policy::{Mode, PolicyGuard, DEFAULT_CAPABILITIES};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the run request when no file is given
const REQUEST_ENV: &str = "ORCHESTRATION_REQUEST";

fn cli() -> Command {
    Command::new("tourney")
        .version(tourney_core::VERSION)
        .about("Multi-agent exploration pipeline with policy gate and tournament scoring")
        .subcommand_required(true)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Write diagnostics to stderr as JSON"),
        )
        .subcommand(
            Command::new("run")
                .about("Run one request and stream events as JSON lines")
                .arg(
                    Arg::new("request")
                        .long("request")
                        .value_parser(value_parser!(PathBuf))
                        .help("Request file (default: $ORCHESTRATION_REQUEST, then stdin)"),
                )
                .arg(
                    Arg::new("session-id")
                        .long("session-id")
                        .help("Session id stamped on every event (default: random UUID)"),
                )
                .arg(
                    Arg::new("parallel")
                        .long("parallel")
                        .action(ArgAction::SetTrue)
                        .help("Run variant chains on the thread pool"),
                ),
        )
        .subcommand(
            Command::new("policy")
                .about("Evaluate the policy gate without running anything")
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .required(true)
                        .value_parser(|s: &str| s.parse::<Mode>())
                        .help("SAFE, GUARDED or POWER"),
                )
                .arg(
                    Arg::new("capability")
                        .long("capability")
                        .action(ArgAction::Append)
                        .help("Requested capability (repeatable; default: the standard set)"),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export from a recorded JSON-lines history")
                .arg(
                    Arg::new("format")
                        .required(true)
                        .value_parser(["best", "scoreboard"])
                        .help("best (JSON) or scoreboard (CSV)"),
                )
                .arg(
                    Arg::new("history")
                        .long("history")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("History file written by `tourney run`"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
}

async fn read_request(path: Option<&PathBuf>) -> Result<String> {
    if let Some(path) = path {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading request file {}", path.display()));
    }
    if let Ok(raw) = std::env::var(REQUEST_ENV) {
        if !raw.trim().is_empty() {
            return Ok(raw);
        }
    }
    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("reading request from stdin")?;
    Ok(raw)
}

async fn run(args: &ArgMatches) -> Result<()> {
    let raw = read_request(args.get_one::<PathBuf>("request")).await?;
    let session_id = args
        .get_one::<String>("session-id")
        .cloned()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let chain_execution = if args.get_flag("parallel") {
        ChainExecution::Parallel
    } else {
        ChainExecution::Sequential
    };
    let session = Session::new()
        .with_settings(PipelineSettings::default().with_chain_execution(chain_execution));

    let report = tokio::task::spawn_blocking(move || {
        let emitter = EventEmitter::new(session_id, JsonLinesSink::new(io::stdout()));
        session.run_request(&raw, &emitter)
    })
    .await
    .context("session task panicked")??;

    if report.was_denied() {
        tracing::info!("Run denied by policy; no pipeline executed");
    }
    Ok(())
}

fn policy(args: &ArgMatches) -> Result<()> {
    let mode = *args
        .get_one::<Mode>("mode")
        .context("--mode is required")?;
    let requested: Vec<String> = match args.get_many::<String>("capability") {
        Some(values) => values.cloned().collect(),
        None => DEFAULT_CAPABILITIES.iter().map(ToString::to_string).collect(),
    };
    let decision = PolicyGuard::new().evaluate(mode, &requested);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn export(args: &ArgMatches) -> Result<()> {
    let path = args
        .get_one::<PathBuf>("history")
        .context("--history is required")?;
    let file = File::open(path).with_context(|| format!("opening history {}", path.display()))?;
    let history = read_history(BufReader::new(file))?;

    match args.get_one::<String>("format").map(String::as_str) {
        Some("best") => println!("{}", serde_json::to_string_pretty(&export_best(&history)?)?),
        _ => println!("{}", export_scoreboard(&history)),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    match matches.subcommand() {
        Some(("run", args)) => run(args).await,
        Some(("policy", args)) => policy(args),
        Some(("export", args)) => export(args),
        _ => unreachable!("subcommand is required"),
    }
}
