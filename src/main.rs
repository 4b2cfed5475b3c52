//! oxcfg - Onyxia user configuration tool
//!
//! Command-line front-end that keeps a user's Onyxia configuration in sync
//! with the secret store.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onyxia_userconfigs::cli::Cli;
use onyxia_userconfigs::config::{self, Config};
use onyxia_userconfigs::Result;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.debug);

    // Execute the command
    if let Err(e) = run(cli).await {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting oxcfg");

    // Only commands reaching the secret store need a complete configuration
    let config: Config = if cli.command.needs_secret_store() {
        config::load_config().await?
    } else {
        config::load_config_no_validation().await?
    };

    cli.execute(config).await?;

    Ok(())
}

fn init_logging(debug: bool) {
    let default_filter = if debug {
        "onyxia_userconfigs=debug,oxcfg=debug"
    } else {
        "onyxia_userconfigs=info,oxcfg=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
