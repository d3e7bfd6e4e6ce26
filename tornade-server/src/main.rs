//! Tornade license server.
//!
//! Runs the activation API, or mints license keys for the payment
//! fulfilment job that emails them to buyers.
//!
//! Usage:
//!   tornade-server serve --port 3000 --db activations.db
//!   tornade-server issue --count 1
//!
//! `TORNADE_LICENSE_SECRET` must be set; the server refuses to start without it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tornade_license::{ActivationLedger, ActivationStore, KeyIssuer, LicenseConfig};
use tornade_server::{SqliteActivationStore, build_router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tornade-server")]
#[command(about = "Tornade license activation server")]
struct Args {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the activation API
    Serve {
        /// HTTP port to listen on
        #[arg(short, long, default_value = "3000", env = "PORT")]
        port: u16,

        /// Path to the SQLite activation database
        #[arg(long, default_value = "tornade-activations.db", env = "TORNADE_DB_PATH")]
        db: PathBuf,
    },
    /// Print freshly minted license keys, one per line
    Issue {
        /// Number of keys to mint
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let config = Arc::new(LicenseConfig::from_env().context("Failed to load license configuration")?);

    match args.command {
        Command::Serve { port, db } => serve(config, port, db).await,
        Command::Issue { count } => {
            issue(config, count);
            Ok(())
        }
    }
}

async fn serve(config: Arc<LicenseConfig>, port: u16, db: PathBuf) -> Result<()> {
    info!("Tornade license server starting...");
    info!(
        "Max activations per key: {}, store timeout: {:?}",
        config.max_activations(),
        config.store_timeout()
    );

    let store: Arc<dyn ActivationStore> = Arc::new(
        SqliteActivationStore::open(&db)
            .with_context(|| format!("Failed to open activation store at {db:?}"))?,
    );
    info!("Activation store opened at {:?}", db);

    let ledger = Arc::new(ActivationLedger::new(config, store));
    let app = build_router(ledger);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP port {port}"))?;
    info!("Activation API listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

fn issue(config: Arc<LicenseConfig>, count: usize) {
    let issuer = KeyIssuer::new(config);
    for _ in 0..count {
        println!("{}", issuer.generate());
    }
    info!("Issued {} license key(s)", count);
}
