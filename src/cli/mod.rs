//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod inspect;
mod publish;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use dealwire::config::load_settings;

#[derive(Parser)]
#[command(name = "dealwire")]
#[command(about = "Resolve aggregator deals to verified merchant links and publish them")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Target HTML document (overrides config)
    #[arg(short, long, global = true)]
    document: Option<PathBuf>,

    /// Data directory for deal records and backups (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Real deals required before publishing (overrides config)
    #[arg(long, global = true)]
    required: Option<usize>,

    /// Delay between candidates in milliseconds (overrides config)
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the listing, resolve deals, save records and publish
    Run {
        /// Listing page to scrape (defaults to the aggregator root)
        #[arg(long)]
        listing: Option<String>,
        /// Resolve and save records without touching the document
        #[arg(long)]
        dry_run: bool,
        /// Skip glossary translation
        #[arg(long)]
        no_translate: bool,
    },

    /// Resolve a single detail page URL and print the outcome
    Resolve {
        /// Aggregator detail URL (absolute or relative to the base URL)
        url: String,
    },

    /// Print the classifier verdict for each URL
    Classify {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Publish previously saved records without re-resolving
    Publish {
        /// Record file (defaults to the newest in the data directory)
        #[arg(long)]
        records: Option<PathBuf>,
        /// Skip the document backup
        #[arg(long)]
        no_backup: bool,
    },

    /// Print the rendered section for saved records
    Render {
        /// Record file (defaults to the newest in the data directory)
        #[arg(long)]
        records: Option<PathBuf>,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut settings, _config) = load_settings(cli.config.as_deref()).await?;

    // Command-line flags take precedence over config and environment
    if let Some(document) = cli.document {
        settings.document = document;
    }
    if let Some(data_dir) = cli.data_dir {
        settings.data_dir = data_dir;
    }
    if let Some(required) = cli.required {
        settings.required_deals = required;
    }
    if let Some(delay) = cli.delay_ms {
        settings.candidate_delay_ms = delay;
    }
    settings.validate()?;

    match cli.command {
        Commands::Run {
            listing,
            dry_run,
            no_translate,
        } => {
            if no_translate {
                settings.translate = false;
            }
            publish::cmd_run(&settings, listing.as_deref(), dry_run).await
        }
        Commands::Resolve { url } => inspect::cmd_resolve(&settings, &url).await,
        Commands::Classify { urls } => inspect::cmd_classify(&settings, &urls),
        Commands::Publish { records, no_backup } => {
            if no_backup {
                settings.backup = false;
            }
            publish::cmd_publish(&settings, records.as_deref())
        }
        Commands::Render { records } => publish::cmd_render(&settings, records.as_deref()),
    }
}
