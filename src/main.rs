//! dealwire command-line entry point.

mod cli;

use std::process::ExitCode;

use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealwire::pipeline::PublishError;

/// Exit status when too few real deals were found to publish.
const EXIT_INSUFFICIENT_DEALS: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "dealwire=info"
    } else {
        "dealwire=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            let insufficient = matches!(
                e.downcast_ref::<PublishError>(),
                Some(PublishError::InsufficientRealDeals { .. })
            );
            if insufficient {
                ExitCode::from(EXIT_INSUFFICIENT_DEALS)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
