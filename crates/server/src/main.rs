//! Sluice server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use sluice_clients::{
    DatasetApiClient, FilesApiClient, FilterApiClient, IdentityApiClient, ImageApiClient,
    ServiceAuth, VaultClient,
};
use sluice_core::AppConfig;
use sluice_server::{AppState, create_router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sluice - download gateway for a statistics-publishing platform
#[derive(Parser, Debug)]
#[command(name = "sluiced")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SLUICE_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Sluice v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("SLUICE_").split("__"))
        .extract()
        .context("failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;

    if config.server.is_publishing {
        tracing::info!("Running in publishing mode, unpublished content served to authorised callers");
    } else {
        tracing::info!("Running in web mode, unpublished content is not served");
    }

    // Initialize storage backend and verify connectivity before accepting
    // requests, catching configuration errors early.
    let storage = sluice_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(backend = storage.backend_name(), "Storage backend initialized");

    // One HTTP client shared by all upstream adapters. Caller deadlines
    // govern overall request time; no client-side timeout is imposed here.
    let http = reqwest::Client::new();
    let service_auth = ServiceAuth {
        service_token: config.upstream.service_auth_token.clone(),
        download_service_token: config.upstream.download_service_token.clone(),
    };

    let dataset = Arc::new(DatasetApiClient::new(
        http.clone(),
        &config.upstream.dataset_api_url,
        service_auth.clone(),
    ));
    let filter = Arc::new(FilterApiClient::new(
        http.clone(),
        &config.upstream.filter_api_url,
        service_auth.clone(),
    ));
    let image = Arc::new(ImageApiClient::new(
        http.clone(),
        &config.upstream.image_api_url,
        service_auth,
    ));
    let files = Arc::new(FilesApiClient::new(
        http.clone(),
        &config.upstream.files_api_url,
    ));
    let identity = Arc::new(IdentityApiClient::new(
        http.clone(),
        &config.upstream.identity_api_url,
    ));
    let secrets = Arc::new(VaultClient::new(
        http,
        &config.vault.addr,
        &config.vault.token,
    ));

    if config.server.max_concurrent_handlers >= 1 {
        tracing::info!(
            limit = config.server.max_concurrent_handlers,
            "Download admission gate enabled"
        );
    } else {
        tracing::info!("Download admission gate disabled (unbounded)");
    }

    let bind = config.server.bind.clone();
    let shutdown_grace = Duration::from_secs(config.server.graceful_shutdown_secs);
    let state = AppState::new(
        config, dataset, filter, image, files, identity, secrets, storage,
    );
    let app = create_router(state);

    let addr: SocketAddr = bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_grace))
        .await?;

    Ok(())
}

/// Resolve on ctrl-c, then allow in-flight downloads a grace period.
async fn shutdown_signal(grace: Duration) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown signal handler");
        return;
    }
    tracing::info!(grace_secs = grace.as_secs(), "Shutdown requested");
}
