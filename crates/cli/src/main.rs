//! Switchboard CLI entry point.
//!
//! Commands:
//! - `serve`: start the HTTP gateway
//! - `chat`: interactive chat or single-message mode
//! - `eval`: score routing against a YAML case file
//! - `onboard`: write a starter config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "switchboard",
    about = "Conversational request router",
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
    /// Start the HTTP gateway server
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the router from the terminal
    Chat {
        /// User whose slot memory and transcript the conversation uses
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Score routing decisions against a YAML case file
    Eval {
        /// Path to the case file
        file: std::path::PathBuf,
    },

    /// Write a starter config file
    Onboard {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { user, message } => commands::chat::run(&user, message).await?,
        Commands::Eval { file } => commands::eval::run(&file).await?,
        Commands::Onboard { force } => commands::onboard::run(force).await?,
    }

    Ok(())
}
