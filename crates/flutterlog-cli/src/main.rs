use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flutterlog_core::history::{HistoryFilter, SortKey};
use flutterlog_infrastructure::{AppConfig, BackendKind, open_backend, open_session_history};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "flutterlog")]
#[command(about = "Flutterlog - butterfly identification history", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User whose history to use (overrides FLUTTERLOG_USER and default_user)
    #[arg(long, short, global = true)]
    user: Option<String>,

    /// Keep history in memory only; nothing is written to disk
    #[arg(long, global = true)]
    memory: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List identification records
    List {
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        #[arg(long, value_enum, default_value_t = SortArg::Date)]
        sort: SortArg,
        /// Print records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a record by hand
    Add {
        #[arg(long)]
        species: String,
        #[arg(long)]
        confidence: f64,
        #[arg(long)]
        image_url: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Record id (a UUID is generated when omitted)
        #[arg(long)]
        id: Option<String>,
        /// ISO-8601 timestamp (now when omitted)
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Save the top prediction of a classifier result file ("-" for stdin)
    Record {
        classification: PathBuf,
        #[arg(long)]
        image_url: String,
    },
    /// Delete a record
    Delete { id: String },
    /// Mark a record verified (or unverified with --unset)
    Verify {
        id: String,
        #[arg(long)]
        unset: bool,
    },
    /// Show aggregate statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Export the full history as pretty-printed JSON
    Export {
        /// Output file or directory (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Seed demonstration records into an empty history
    Seed,
    /// Remove the whole history for the user
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Verified,
    Unverified,
}

impl From<FilterArg> for HistoryFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => Self::All,
            FilterArg::Verified => Self::Verified,
            FilterArg::Unverified => Self::Unverified,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Date,
    Confidence,
    Species,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Date => Self::Date,
            SortArg::Confidence => Self::Confidence,
            SortArg::Species => Self::Species,
        }
    }
}

fn init_tracing(verbose: bool, default_level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load_default(),
    }
    .context("Failed to load configuration")?;

    init_tracing(cli.verbose, &config.log_level);

    let session = config.resolve_session(cli.user.as_deref());
    if !session.is_authenticated() {
        tracing::warn!("No user given (--user, FLUTTERLOG_USER or default_user); history is empty");
    }

    let kind = BackendKind::from_config(&config, cli.memory)
        .context("Failed to resolve storage directory")?;
    let mut history = open_session_history(open_backend(&kind), &session, &config)
        .context("Failed to open history")?;

    let mut out = std::io::stdout().lock();
    match cli.command {
        Commands::List { filter, sort, json } => {
            commands::history::list(&history, filter.into(), sort.into(), json, &mut out)?
        }
        Commands::Add {
            species,
            confidence,
            image_url,
            location,
            notes,
            id,
            timestamp,
        } => {
            let input = commands::history::NewRecord {
                species,
                confidence,
                image_url,
                location,
                notes,
                id,
                timestamp,
            };
            commands::history::add(&mut history, input, &mut out)?
        }
        Commands::Record {
            classification,
            image_url,
        } => commands::history::record(&mut history, &classification, image_url, &mut out)?,
        Commands::Delete { id } => commands::history::delete(&mut history, &id, &mut out)?,
        Commands::Verify { id, unset } => {
            commands::history::verify(&mut history, &id, !unset, &mut out)?
        }
        Commands::Stats { json } => commands::history::stats(&history, json, &mut out)?,
        Commands::Export { output } => {
            commands::history::export(&history, output.as_deref(), &mut out)?
        }
        Commands::Seed => commands::history::seed(&mut history, &mut out)?,
        Commands::Clear => commands::history::clear(&mut history, &mut out)?,
    }

    Ok(())
}
