use anyhow::Context;
use std::sync::Arc;
use telemetry::metrics::Telemetry;
use weight_api::metrics::ServerMetrics;
use weight_api::shutdown::{ShutdownCoordinator, listen_for_shutdown_signals};

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;

fn main() {
    let version = weight_api::VERSION.unwrap_or("unknown").to_string();
    let config = weight_api::Config::load().expect("Failed to load config");

    // Keep the guard alive for the whole process so events are flushed on exit
    let _sentry = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime")
        .block_on(async {
            if let Err(e) = setup(config, version).await {
                tracing::error!("Fatal error during setup: {e:#}");
                std::process::exit(1);
            }
        });
}

async fn setup(config: weight_api::Config, version: String) -> anyhow::Result<()> {
    let filter_layer = if config.rust_log.is_empty() {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))
    } else {
        EnvFilter::try_new(&config.rust_log)
    }
    .map_err(|e| anyhow::anyhow!(e))
    .context("Failed to initialize tracing filter")?;

    let use_json = config.log_format != "pretty";

    if use_json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_timer(UtcTime::rfc_3339())
            .with_target(true)
            .with_level(true)
            .json();
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true)
            .pretty();
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    };

    let addr: String = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting weight-api {version} at: {addr}");

    let db = sqlite_models::connection::establish_connection(
        config.database_url.clone(),
        sqlite_models::MIGRATIONS,
    )
    .await
    .with_context(|| {
        format!("Failed to open SQLite database at {}", config.database_url)
    })?;
    tracing::info!("Opened SQLite database at {}", config.database_url);

    let shutdown = Arc::new(ShutdownCoordinator::new(db.clone()));

    let metrics =
        ServerMetrics::new(None).context("Failed to create server metrics")?;
    let telemetry = Telemetry::new(Some(metrics));
    tracing::info!("Initialized telemetry");

    let app_state = weight_api::AppState {
        telemetry,
        db,
        config: Arc::new(config),
        shutdown: shutdown.clone(),
    };
    let app = weight_api::router(app_state);

    // Spawn shutdown signal handler
    let shutdown_handle = shutdown.clone();
    let shutdown_task = tokio::spawn(async move {
        listen_for_shutdown_signals().await;
        shutdown_handle.shutdown().await;
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    let shutdown_for_serve = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_for_serve.wait_for_shutdown().await
        })
        .await
        .context("Server exited with error")?;

    // Let the database finish its checkpoint before the runtime goes away
    shutdown_task
        .await
        .context("Shutdown task panicked")?;

    Ok(())
}
