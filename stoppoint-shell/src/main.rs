// Stoppoint Shell - interactive breakpoint management
//
// Reads commands from stdin, one per line. Breakpoint change events are
// echoed as they happen; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use stoppoint::EngineConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

mod commands;
mod handlers;
mod session;

use handlers::CommandHandler;
use session::{describe_event, ShellSession};

#[derive(Parser, Debug)]
#[command(name = "stoppoint", version, about = "Breakpoint management shell")]
struct Args {
    /// Engine configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Breakpoints file, overrides the configured one
    #[arg(long)]
    breakpoints: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stoppoint=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(path) = args.breakpoints {
        config.breakpoints_file = Some(path);
    }

    let session = ShellSession::open(config).context("opening breakpoint session")?;
    let mut events = session.subscribe();
    let handler = CommandHandler::new(session);

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => println!("[event] {}", describe_event(&event)),
                Err(RecvError::Lagged(missed)) => warn!("Dropped {} change events", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!("Stoppoint shell ready, type help for commands");

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            debug!("End of input");
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }

        let output = match handler.handle_line(line) {
            Ok(text) => text,
            Err(message) => format!("error: {}", message),
        };
        if !output.is_empty() {
            stdout.write_all(output.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    handler.session().close()?;
    info!("Goodbye");
    Ok(())
}
