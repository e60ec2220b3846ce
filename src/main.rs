//! coursegraph - course catalog snapshot service
//!
//! Fetches the Portal JSONP course feed, normalizes it into a flat entity
//! graph, persists it as courses.json, and serves it alongside the static
//! front end, refreshing in the background on a fixed interval.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursegraph::catalog::NormalizerOptions;
use coursegraph::config;
use coursegraph::portal::PortalClient;
use coursegraph::refresh::{self, Refresher};
use coursegraph::{build_router, AppState};

/// Command-line arguments for coursegraph
#[derive(Parser, Debug)]
#[command(name = "coursegraph")]
#[command(about = "Course catalog snapshot service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000", env = "PORT")]
    port: u16,

    /// Only serve existing assets; never regenerate the snapshot
    #[arg(long, overrides_with = "no_manual")]
    manual: bool,

    /// Negate a previous --manual
    #[arg(long = "no-manual", overrides_with = "manual")]
    no_manual: bool,

    /// Run one fetch-normalize-write pass and exit without serving
    #[arg(long)]
    once: bool,

    /// Directory holding static assets and the generated snapshot
    #[arg(long, env = "COURSEGRAPH_ASSETS_DIR")]
    assets_dir: Option<PathBuf>,

    /// Drop calendar/session/instructor records no retained section uses
    #[arg(long)]
    prune_orphans: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursegraph=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let manual = args.manual && !args.no_manual;

    info!("Starting coursegraph v{}", env!("CARGO_PKG_VERSION"));

    let assets_dir = config::resolve_assets_dir(args.assets_dir.clone());
    info!("Assets directory: {}", assets_dir.display());

    let refresher = Refresher::new(
        PortalClient::new()?,
        assets_dir.clone(),
        NormalizerOptions {
            prune_orphans: args.prune_orphans,
        },
    );

    if args.once {
        refresher
            .run_once()
            .await
            .context("Failed to generate snapshot")?;
        return Ok(());
    }

    if !manual {
        // The server does not come up until a snapshot exists.
        refresher.run_until_success().await;
    }

    let state = AppState::new(assets_dir);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Server running on port {}", args.port);

    let background = if manual {
        None
    } else {
        Some(refresh::spawn_periodic(
            refresher,
            refresh::REFRESH_INTERVAL,
        ))
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = background {
        handle.shutdown().await;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
