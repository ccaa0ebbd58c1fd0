//! CLI for the mailspend expense pipeline.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, poll, process, serve};

/// mailspend - log expense emails to a spreadsheet ledger
#[derive(Parser)]
#[command(name = "mailspend")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook ingress server
    Serve(serve::ServeArgs),

    /// Poll the mailbox for unseen messages
    Poll(poll::PollArgs),

    /// Run a local text or image input through the pipeline
    Process(process::ProcessArgs),

    /// Inspect the resolved configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Poll(args) => poll::run(args).await,
        Commands::Process(args) => process::run(args).await,
        Commands::Config(args) => config::run(args).await,
    }
}
