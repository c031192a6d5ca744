//! vroom-sync - Saved-filter view synchronization service
//!
//! Mirrors Stash saved filters whose names carry an active prefix
//! (`VR | Recent`) as ordered views, keeps them in sync with repeated
//! incremental passes, and serves the resulting library over HTTP.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vroom_common::config::{self, LoggingConfig, TomlConfig, DEFAULT_BIND, DEFAULT_STASH_URL};

use vroom_sync::classify::IdentityClassifier;
use vroom_sync::services::{LibraryProjector, StashAuth, StashClient, SyncEngine, Upstream, ViewCatalog};
use vroom_sync::AppState;

/// Command-line arguments for vroom-sync
#[derive(Parser, Debug)]
#[command(name = "vroom-sync")]
#[command(about = "Stash saved-filter view synchronization service")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config_dir>/vroom/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stash GraphQL endpoint
    #[arg(long)]
    stash_url: Option<String>,

    /// Stash API key
    #[arg(long)]
    api_key: Option<String>,

    /// Listen address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    init_tracing(&toml_config.logging)?;

    info!("Starting vroom-sync");
    info!(
        "Version: {} (build {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("VROOM_GIT_HASH"),
        env!("VROOM_BUILD_PROFILE")
    );

    let stash_url = config::resolve_setting(
        args.stash_url.as_deref(),
        "VROOM_STASH_URL",
        Some(&toml_config.stash_url),
        DEFAULT_STASH_URL,
    );
    let bind = config::resolve_setting(
        args.bind.as_deref(),
        "VROOM_BIND",
        Some(&toml_config.bind),
        DEFAULT_BIND,
    );

    let auth = match config::resolve_api_key(args.api_key.as_deref(), &toml_config) {
        Some(key) => StashAuth::ApiKey(key),
        None => match toml_config.session_cookie.clone() {
            Some(cookie) => {
                info!("Using Stash session cookie");
                StashAuth::SessionCookie(cookie)
            }
            None => {
                warn!("No Stash credentials configured, connecting unauthenticated");
                StashAuth::None
            }
        },
    };

    let timeout = Duration::from_secs(toml_config.sync.request_timeout_secs);
    let client = StashClient::new(stash_url.clone(), auth, timeout)
        .context("Failed to create Stash client")?;
    info!("Stash endpoint: {}", stash_url);

    match client.version().await {
        Ok(version) => info!("Connected to Stash {}", version),
        Err(e) => warn!("Stash not reachable yet: {}", e),
    }

    let catalog = ViewCatalog::new(&toml_config.catalog).context("Invalid catalog configuration")?;
    let classifier = IdentityClassifier::new(&toml_config.classifier.video_extensions)
        .context("Invalid classifier configuration")?;
    let upstream: Arc<dyn Upstream> = Arc::new(client);
    let engine = Arc::new(SyncEngine::new(
        upstream,
        catalog,
        LibraryProjector::new(classifier),
    ));

    match engine.run_pass().await {
        Ok(report) => info!(
            views = report.views.len(),
            failed = report.failures().count(),
            "Initial synchronization complete"
        ),
        Err(e) => warn!("Initial synchronization failed: {}", e),
    }

    let interval_task = toml_config
        .sync
        .interval_secs
        .filter(|secs| *secs > 0)
        .map(|secs| {
            info!("Periodic synchronization every {}s", secs);
            engine.spawn_interval(Duration::from_secs(secs))
        });

    let state = AppState::new(Arc::clone(&engine), toml_config.public_url.clone());
    let app = vroom_sync::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(task) = interval_task {
        task.abort();
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides `logging.level`. Output goes to `logging.file` when set,
/// otherwise to stderr.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let (stderr_layer, file_layer) = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
