//! Binary entry point: load configuration, wire the core together, and
//! serve HTTP until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use log_distributor::config::Config;
use log_distributor::counters::Counters;
use log_distributor::dispatch::DispatchPipeline;
use log_distributor::ingest::{router, AppState};
use log_distributor::registry::AnalyzerRegistry;
use log_distributor::sweeper;

#[derive(Parser, Debug)]
#[command(name = "log-distributor")]
#[command(about = "Weighted log-packet distributor")]
#[command(version)]
struct CliArgs {
    /// Override the HTTP bind address (otherwise BIND_ADDRESS env var, then 0.0.0.0:8080).
    #[arg(short, long, env = "BIND_ADDRESS")]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal in production; anything else is worth a note.
    match dotenvy::dotenv() {
        Ok(_) | Err(dotenvy::Error::Io(_)) => {}
        Err(e) => eprintln!("warning: failed to load .env: {e}"),
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let config = Config::from_env(args.addr).context("failed to load configuration")?;

    info!(
        analyzers = config.analyzers.len(),
        bind_address = %config.bind_address,
        "starting log distributor"
    );

    let registry = Arc::new(AnalyzerRegistry::new(config.analyzers));
    let counters = Arc::new(Counters::new());
    let tunables = Arc::new(config.tunables);

    let (dispatch, worker_handles) =
        DispatchPipeline::new(registry.clone(), counters.clone(), tunables.clone());

    let sweeper_handle = tokio::spawn(sweeper::run(registry.clone(), tunables.clone()));

    let state = AppState {
        registry: registry.clone(),
        counters: counters.clone(),
        tunables: tunables.clone(),
        dispatch: dispatch.clone(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_address))?;

    info!("HTTP server listening on {}", config.bind_address);

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
        })
        .await;

    if let Err(e) = serve_result {
        error!(error = %e, "HTTP server error");
    }

    sweeper_handle.abort();

    // Drop every Arc<DispatchPipeline> clone we're holding so the channel
    // closes, then let the workers drain and exit.
    drop(dispatch);
    for handle in worker_handles {
        let _ = handle.await;
    }

    info!("shutdown complete");
    Ok(())
}
