use audiotube::error::{ErrorKind, Result};
use audiotube_config::Config;
use clap::{Parser, Subcommand};
use exn::ResultExt;
use std::path::PathBuf;
use std::process::ExitCode;

/// AudioTube backend server
#[derive(Parser)]
#[command(name = "audiotube", version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to `audiotube.toml` in the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Default)]
enum Command {
    /// Serve the HTTP API (default)
    #[default]
    Serve,
    /// Delete expired login tokens and stale stream-cache entries, then exit
    Purge,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "Fatal error");
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    audiotube::logging::init(&config.logging)?;
    match cli.command.unwrap_or_default() {
        Command::Serve => audiotube::serve(config).await,
        Command::Purge => {
            let report = audiotube::purge(&config).await?;
            tracing::info!(tokens = report.tokens, streams = report.streams, "Purge complete");
            Ok(())
        },
    }
}
