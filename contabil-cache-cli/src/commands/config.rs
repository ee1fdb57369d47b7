//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use clap::Subcommand;
use contabil_cache::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective settings (file values over defaults)
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init { force } => run_init(force),
    }
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn run_show() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load_from(&path)?;

    println!("Configuration Settings");
    println!("======================");
    if path.exists() {
        println!("(from {})", path.display());
    } else {
        println!("(defaults; {} does not exist)", path.display());
    }
    println!();

    println!("[cache]");
    println!("  max_entries  = {}", config.cache.max_entries);
    println!("  ttl_low      = {}s", config.cache.ttl_low);
    println!("  ttl_medium   = {}s", config.cache.ttl_medium);
    println!("  ttl_high     = {}s", config.cache.ttl_high);
    println!("  ttl_critical = {}s", config.cache.ttl_critical);
    println!();

    let worker = config.worker_config();
    println!("[worker]");
    println!("  version = {}", worker.version);
    println!("  buckets = {}", worker.current_bucket_names().join(", "));
    print_list("static_assets", &worker.static_assets);
    print_list("optional_assets", &worker.optional_assets);
    print_list("app_routes", &worker.app_routes);
    print_list("api_patterns", &worker.api_patterns);
    println!();

    println!("[logging]");
    println!("  file = {}", config.logging.file.display());

    Ok(())
}

fn print_list(name: &str, items: &[String]) {
    if items.is_empty() {
        println!("  {} = (none)", name);
    } else {
        println!("  {} =", name);
        for item in items {
            println!("    {}", item);
        }
    }
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();

    if force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(&path)? {
        println!("Created {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
    }

    Ok(())
}
