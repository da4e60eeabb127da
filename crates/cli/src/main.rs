//! docchat CLI: the main entry point.
//!
//! Commands:
//! - `onboard`  Create the default config file
//! - `chat`     Interactive document-grounded chat
//! - `ask`      One question (or canned action) about a document
//! - `extract`  Print the text extracted from a document
//! - `status`   Show the resolved configuration
//! - `doctor`   Diagnose configuration problems

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docchat_config::Preset;
use docchat_session::CannedAction;

mod commands;

#[derive(Parser)]
#[command(
    name = "docchat",
    about = "docchat — ask a language model about your resume (or any document)",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create ~/.docchat/config.toml with defaults
    Onboard,

    /// Chat interactively about a document
    Chat {
        /// Load this document before the first question
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Use one of the shipped deployments (neutral, skeptical)
        #[arg(long)]
        preset: Option<Preset>,

        /// Print each prompt sent to the model
        #[arg(long)]
        show_prompt: bool,
    },

    /// Ask a single question about a document
    Ask {
        /// The document to ask about
        #[arg(short, long)]
        document: PathBuf,

        /// Run a canned action (roast, score, improve) instead of a question
        #[arg(short, long, conflicts_with = "message")]
        action: Option<CannedAction>,

        /// Use one of the shipped deployments (neutral, skeptical)
        #[arg(long)]
        preset: Option<Preset>,

        /// Print the prompt sent to the model
        #[arg(long)]
        show_prompt: bool,

        /// The question
        #[arg(required_unless_present = "action")]
        message: Option<String>,
    },

    /// Print the text extracted from a PDF or text file
    Extract {
        path: PathBuf,
    },

    /// Show the resolved configuration
    Status,

    /// Diagnose configuration problems
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            document,
            preset,
            show_prompt,
        } => commands::chat::run(document, preset, show_prompt).await?,
        Commands::Ask {
            document,
            action,
            preset,
            show_prompt,
            message,
        } => commands::ask::run(document, action, message, preset, show_prompt).await?,
        Commands::Extract { path } => commands::extract::run(path).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
