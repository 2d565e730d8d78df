//! Token ledger server binary

use anyhow::Context;
use token_ledger::{Config, TokenLedger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting token ledger server");

    // Load configuration
    let config = Config::from_env().context("loading configuration")?;

    // Open ledger
    let ledger = TokenLedger::open(config).await.context("opening ledger")?;
    let summary = ledger.summary().await?;
    tracing::info!(
        owner = %summary.owner,
        cap = summary.cap,
        total_supply = summary.total_supply,
        "Ledger opened"
    );

    // TODO: expose the call surface over the host transport here
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down token ledger server");
    ledger.shutdown().await?;
    Ok(())
}
