//! SubSync: extract AI chat transcripts and ask questions about them.

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use subsync_core::{SubSyncConfig, DEFAULT_CONTEXT_WINDOW};
use subsync_extract::{format_turns, TranscriptExtractor};
use subsync_runtime::{FilePage, RuntimeContext, SubmitOutcome};

mod command;

use command::{Command, USAGE};

fn resolve_data_dir() -> PathBuf {
    std::env::var("SUBSYNC_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn open_runtime() -> anyhow::Result<RuntimeContext> {
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());
    let config = SubSyncConfig::from_env(&data_dir)?;
    RuntimeContext::open(config).map_err(|e| anyhow::anyhow!("Failed to open runtime: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match command::parse(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    };

    match command {
        Command::Help => {
            println!("{}", USAGE);
        }
        Command::Extract { file, host } => {
            let html = std::fs::read_to_string(&file)?;
            let extractor = TranscriptExtractor::for_host(&host);
            print!("{}", extractor.extract_html(&html));
        }
        Command::Tail { file, host, count } => {
            let html = std::fs::read_to_string(&file)?;
            let extractor = TranscriptExtractor::for_host(&host);
            let turns = extractor.last_turns_html(&html, count.unwrap_or(DEFAULT_CONTEXT_WINDOW));
            print!("{}", format_turns(&turns));
        }
        Command::Ask {
            file,
            host,
            question,
            session,
        } => {
            let runtime = open_runtime()?;
            let surface = runtime.surface(Box::new(FilePage::new(host, file)), session.as_deref());
            surface.open();

            match surface.submit(&question).await? {
                SubmitOutcome::Answered(turn) => println!("{}", turn.content),
                SubmitOutcome::Failed { notice, error } => {
                    eprintln!("{}", error);
                    println!("{}", notice.content);
                }
            }
            eprintln!("session: {}", surface.session_id());
        }
        Command::Health => {
            let runtime = open_runtime()?;
            let healthy = runtime.orchestrator().check_health().await;
            println!(
                "{}: {}",
                runtime.orchestrator().config().backend_url(),
                if healthy { "ok" } else { "unreachable" }
            );
            std::process::exit(if healthy { 0 } else { 1 });
        }
        Command::Sweep => {
            let runtime = open_runtime()?;
            let removed = runtime.swept_on_open() + runtime.sweep_expired();
            println!("Removed {} expired snapshots", removed);
        }
    }

    Ok(())
}
