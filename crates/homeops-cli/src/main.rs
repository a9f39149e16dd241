//! HomeOps CLI - sign in and browse HomeOps entries from the terminal.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use homeops_config::{init_logging, Config, LogFormat, Paths, StoreMode};
use homeops_sync::Category;
use std::path::PathBuf;
use tracing::debug;

/// HomeOps CLI - sign in, list and record home maintenance entries.
#[derive(Parser)]
#[command(name = "homeops")]
#[command(about = "HomeOps CLI for browsing and recording home maintenance entries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write structured JSONL logs to the logs directory instead of stderr
    #[arg(long, global = true)]
    json_logs: bool,

    /// Record store to use (mock or live). Overrides the configured mode
    #[arg(long, global = true)]
    store_mode: Option<StoreMode>,

    /// Base directory for config and logs. Defaults to ~/.homeops
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

/// Credentials, prompted for when not given.
#[derive(clap::Args, Debug, Default)]
struct Credentials {
    /// Account email
    #[arg(long, env = "HOMEOPS_EMAIL")]
    email: Option<String>,

    /// Account password
    #[arg(long, env = "HOMEOPS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and list entries (default)
    List {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Sign in and record a new entry
    Add {
        /// Entry type (fix, improvement, repair, todo)
        #[arg(short = 't', long = "type")]
        category: Category,

        /// Entry title
        title: String,

        /// Numeric value (cost, hours, ...)
        #[arg(short, long)]
        value: Option<f64>,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Inspect or change the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Update and save configuration values
    Set {
        /// Record store to save (mock or live)
        #[arg(long)]
        mode: Option<StoreMode>,
        /// Supabase project URL
        #[arg(long)]
        supabase_url: Option<String>,
        /// Supabase anonymous API key
        #[arg(long)]
        supabase_anon_key: Option<String>,
        /// Default log level to save
        #[arg(long)]
        default_log_level: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths)?;
    if let Some(mode) = cli.store_mode {
        config.store_mode = mode;
    }

    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let log_format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    init_logging(log_level, log_format, &paths)?;
    debug!(store_mode = %config.store_mode, "configuration loaded");

    let format = cli.format;
    match cli.command {
        None => commands::entries::list(&config, Credentials::default(), &format).await?,
        Some(Commands::List { credentials }) => {
            commands::entries::list(&config, credentials, &format).await?
        }
        Some(Commands::Add {
            category,
            title,
            value,
            notes,
            credentials,
        }) => {
            let mut record = homeops_sync::NewRecord::new(category, title);
            record.value = value;
            record.notes = notes;
            commands::entries::add(&config, credentials, record, &format).await?
        }
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => commands::config::show(&config, &paths, &format)?,
            ConfigCommands::Set {
                mode,
                supabase_url,
                supabase_anon_key,
                default_log_level,
            } => commands::config::set(
                &paths,
                commands::config::ConfigUpdate {
                    store_mode: mode,
                    supabase_url,
                    supabase_anon_key,
                    log_level: default_log_level,
                },
                &format,
            )?,
        },
    }

    Ok(())
}
