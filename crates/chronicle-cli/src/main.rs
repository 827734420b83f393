use std::path::PathBuf;

use chronicle::config::Config;
use chronicle_cli::commands::{ConfigCommand, CurateCommand, GapsCommand};
use chronicle_cli::error::CliResult;
use chronicle_cli::output::OutputFormat;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chronicle")]
#[command(about = "Chronicle - curate long message timelines into representative highlights")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Select representative messages from a timeline")]
    Curate(CurateCommand),

    #[clap(about = "List communication gaps in a timeline")]
    Gaps(GapsCommand),

    #[clap(about = "Configuration commands")]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    init_logging();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Curate(cmd) => {
            let cancel = CancellationToken::new();
            let signal_token = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, cancelling curation");
                    signal_token.cancel();
                }
            });
            cmd.execute(&config, &cancel, format).await
        }
        Command::Gaps(cmd) => cmd.execute(&config, format).await,
        Command::Config(cmd) => cmd.execute(&config, format).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,chronicle=info"));

    // Logs go to stderr so JSON on stdout stays parseable
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
