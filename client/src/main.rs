//! Storefront admin CLI entry-point: wires the Supabase adapters into the domain.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use storefront::inbound::cli::{App, Cli};
use storefront::outbound::supabase::{SupabaseClient, SupabaseSettings};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let settings = SupabaseSettings::from_env(&DefaultEnv::new());
    if !settings.has_valid_config() {
        warn!("Supabase configuration missing; requests will fail");
    }
    let client = SupabaseClient::new(&settings).wrap_err("create Supabase client")?;
    info!(url = settings.url(), "Supabase client ready");

    let app = App::start(
        Arc::new(client.auth()),
        Arc::new(client.categories()),
        client.probe(),
    );
    let mut stdout = io::stdout().lock();
    let outcome = app.run(&cli, &mut stdout).await;
    app.shutdown().await;
    outcome.wrap_err("command failed")?;
    Ok(())
}
