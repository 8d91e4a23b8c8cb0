//! Entry point for the Payroll Ledger binary.
//!
//! Running this binary starts the HTTP server behind the e-mail
//! allow-list.  Settings come from the environment (an optional `.env`
//! file is loaded first); see [`payroll_ledger::config::Config`].  Log
//! verbosity follows `RUST_LOG`.

use anyhow::Result;
use payroll_ledger::api;
use payroll_ledger::config::Config;
use payroll_ledger::store::MemoryStore;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("payroll_ledger=info")),
        )
        .init();

    let config = Config::from_env()?;
    if config.allowed_emails.is_empty() {
        warn!("PAYROLL_ALLOWED_EMAILS is empty; every /api request will be rejected");
    }
    info!(
        bind_addr = %config.bind_addr,
        allowed = config.allowed_emails.len(),
        fired_retention_days = config.fired_retention_days,
        "starting payroll ledger"
    );

    api::serve(config, Arc::new(MemoryStore::new())).await
}
