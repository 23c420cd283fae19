use anyhow::{bail, Context, Result};
use clap::Parser;
use discussion_core::config::Config;
use discussion_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use discussion_core::DiscussionSqlStore;
use std::path::PathBuf;
use tracing::{debug, warn};

mod commands;

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "discussion")]
#[command(author, version, about = "Manage discussions, members and invitations", long_about = None)]
struct Args {
    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Username to act as
    #[arg(long = "as", global = true)]
    as_user: Option<String>,

    /// Set the log level (trace, debug, info, warn, error); overrides the config
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable JSON formatted logging; overrides the config
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::from_env()?,
    };

    if let Some(db) = &args.db {
        config.store.database_path = Some(db.clone());
    }
    if config.store.database_path.is_none() {
        bail!("no database configured; pass --db or set DISCUSSION_STORE_DATABASE_PATH");
    }

    Ok(config)
}

/// `[logging]` from the config, with any command-line flags applied on top
fn log_config(args: &Args, config: &Config) -> Result<LogConfig> {
    let mut log_config = LogConfig::try_from(&config.logging)?;

    if let Some(level) = &args.log_level {
        match level.parse::<LogLevel>() {
            Ok(level) => log_config.level = level,
            Err(e) => eprintln!("{}, using '{}'", e, log_config.level.as_str()),
        }
    }
    if args.json_logs {
        log_config = log_config.json_format(true);
    }

    Ok(log_config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args)?;
    init_logging_with_config(log_config(&args, &config)?)?;

    if config.metrics.enabled {
        discussion_core::metrics::init_metrics();
    }

    let store = DiscussionSqlStore::open(&config.store)?;
    debug!(command = ?args.command, "Running command");

    match commands::execute(store, args.as_user.as_deref(), args.command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Command failed");
            Err(e)
        }
    }
}
