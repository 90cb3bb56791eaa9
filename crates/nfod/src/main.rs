use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use nfoconf::NfoConfig;
use nfod::groups::{self, GroupService};
use nfod::{telemetry, tls, web, Pages, TokenSet, WebState};
use nfostore::{ArtifactStore, FileStore};
use tokio_util::sync::CancellationToken;

/// Ephemeral info file viewer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file, used instead of ./nfoview.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Artifact store directory (overrides config)
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = NfoConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.infra.bind.http_port = port;
    }
    if let Some(store_dir) = cli.store_dir {
        config.infra.paths.store_dir = store_dir;
    }

    if cli.show_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    let telemetry =
        telemetry::init(&config.infra.telemetry).context("Failed to initialize telemetry")?;

    for file in &sources.files {
        tracing::info!("   Config file: {}", file.display());
    }
    for var in &sources.env_overrides {
        tracing::info!("   Env override: {}", var);
    }

    let paths = &config.infra.paths;

    tracing::info!("📦 Opening artifact store...");
    let store = FileStore::at_path(&paths.store_dir).context("Failed to open artifact store")?;
    let cleared = store.clear_staging().context("Failed to clear staging area")?;
    if cleared > 0 {
        tracing::info!("   Removed {} abandoned staging files", cleared);
    }
    tracing::info!("   Store ready at: {}", paths.store_dir.display());
    let store: Arc<dyn ArtifactStore> = Arc::new(store);

    let render =
        groups::render_options(&config.artifacts.render).context("Invalid render settings")?;
    let retention = &config.artifacts.retention;

    let shutdown_token = CancellationToken::new();
    let (groups, reaper) =
        GroupService::start(store, render, retention.ttl(), shutdown_token.clone());
    tracing::info!("🧹 Eviction armed: groups expire after {}s", retention.ttl_secs);

    if retention.persist_deadlines {
        let report = groups.restore().await.context("Failed to restore groups")?;
        tracing::info!(
            restored = report.restored,
            overdue = report.overdue,
            corrupt = report.corrupt,
            "   Restored eviction deadlines from stored records"
        );
    }

    let tokens = TokenSet::load(&paths.token_file)?;
    tracing::info!("🔑 Loaded {} upload tokens", tokens.len());

    let state = WebState {
        groups,
        tokens,
        pages: Pages::new()?,
        static_dir: paths.static_dir.clone(),
        start_time: Instant::now(),
    };
    let app = web::router(state);

    let rustls = tls::load_rustls_config(&config.infra.tls).await?;
    let scheme = if rustls.is_some() { "https" } else { "http" };
    let addr = config.infra.bind.addr();

    let server = match rustls {
        Some(rustls) => {
            let socket: SocketAddr = addr
                .parse()
                .with_context(|| format!("Invalid bind address {addr}"))?;
            let handle = axum_server::Handle::new();

            let shutdown_handle = handle.clone();
            let shutdown_token_srv = shutdown_token.clone();
            tokio::spawn(async move {
                shutdown_token_srv.cancelled().await;
                tracing::info!("Server shutdown signal received");
                shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
            });

            let server = axum_server::bind_rustls(socket, rustls)
                .handle(handle)
                .serve(app.into_make_service());
            tokio::spawn(async move {
                if let Err(e) = server.await {
                    tracing::error!("Server shutdown with error: {:?}", e);
                }
            })
        }
        None => {
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;

            let shutdown_token_srv = shutdown_token.clone();
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                shutdown_token_srv.cancelled().await;
                tracing::info!("Server shutdown signal received");
            });
            tokio::spawn(async move {
                if let Err(e) = server.await {
                    tracing::error!("Server shutdown with error: {:?}", e);
                }
            })
        }
    };

    tracing::info!("📄 nfod starting on {}://{}", scheme, addr);
    tracing::info!("   Upload: POST {}://{}/upload_nfo", scheme, addr);
    tracing::info!("   Viewer: GET {}://{}/viewer/:id", scheme, addr);
    tracing::info!("   Image: GET {}://{}/image/:id", scheme, addr);
    tracing::info!("   Health: GET {}://{}/health", scheme, addr);

    wait_for_signal().await;
    shutdown_token.cancel();

    if let Err(e) = server.await {
        tracing::error!("Server task failed: {}", e);
    }
    if let Err(e) = reaper.await {
        tracing::error!("Eviction task failed: {}", e);
    }

    tracing::info!("👋 Shutdown complete");
    telemetry.shutdown();
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM (systemd, container runtimes).
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to setup SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}
