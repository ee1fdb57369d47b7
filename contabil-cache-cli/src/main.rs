//! contabil-cache CLI
//!
//! Inspect configuration, check how requests are classified, and run a
//! scripted session against the cache layer.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;

#[derive(Parser)]
#[command(name = "contabil-cache")]
#[command(version = contabil_cache::VERSION)]
#[command(about = "ContabilidadePRO cache layer tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show how URLs are classified and which strategy serves them
    Classify {
        /// Request URLs (absolute or origin-relative)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Treat the requests as page navigations
        #[arg(long)]
        navigate: bool,

        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,
    },

    /// Print the offline fallback page
    OfflinePage,

    /// Run a scripted session against in-process backends
    Demo {
        /// User the application cache belongs to
        #[arg(long, default_value = "demo-user")]
        user: String,

        /// Also log to stdout at debug level
        #[arg(long, short)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config { command } => commands::config::run(command),
        Commands::Classify {
            urls,
            navigate,
            method,
        } => commands::classify::run(&urls, navigate, &method),
        Commands::OfflinePage => commands::offline::run(),
        Commands::Demo { user, verbose } => commands::demo::run(&user, verbose).await,
    };

    if let Err(e) = result {
        e.exit();
    }
}
