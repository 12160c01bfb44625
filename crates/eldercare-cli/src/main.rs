//! Eldercare CLI
//!
//! Streams a chunked or NDJSON HTTP response to the terminal, or collects it
//! into a single JSON array.

use clap::{Parser, Subcommand};
use tracing::info;

use eldercare_cli::stream_cmd::{self, StreamArgs};
use eldercare_core::config::load_config;
use eldercare_core::tracing_init::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "eldercare")]
#[command(version, about = "Chunked response streaming CLI", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print each chunk of a response as it arrives.
    Stream(StreamArgs),
    /// Read a whole NDJSON response and print its records as one JSON array.
    Collect(StreamArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let config = load_config(Some(&cwd))?;

    init_tracing(
        &format!(
            "eldercare_core={level},eldercare_cli={level}",
            level = config.log_level
        ),
        cli.log_json,
    );

    info!(version = env!("CARGO_PKG_VERSION"), "Starting eldercare CLI");

    match cli.command {
        Command::Stream(args) => stream_cmd::run_stream(args, &config).await,
        Command::Collect(args) => stream_cmd::run_collect(args, &config).await,
    }
}
