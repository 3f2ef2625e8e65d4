use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use autosrt_core::config::{LogFormat, LoggingConfig};
use autosrt_core::{
    create_telemetry_system, load_config, validate_config, ComputeService, ConversionOrchestrator,
    FsObjectStore, HistoryStore, HttpComputeClient, HttpEmailNotifier, JobQueue, LogNotifier,
    NatsJobQueue, Notifier, ObjectStore, SqliteHistoryStore, SqliteTelemetryStore,
    SqliteUsageStore, SubtitleJobHandler, TelemetryEvent, TelemetryStore, UsageLedger,
    UsageStore, WorkerPool,
};

use autosrt_server::api::create_router;
use autosrt_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for the telemetry event channel
const TELEMETRY_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("AUTOSRT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Logging comes from the config, so fall back to defaults when it fails to load
    let loaded = load_config(&config_path);
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_logging(&logging);

    info!("Loading configuration from {:?}", config_path);
    let config =
        loaded.with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Compute config hash for telemetry
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    // SQLite stores share one database file
    let usage_store: Arc<dyn UsageStore> = Arc::new(
        SqliteUsageStore::new(&config.database.path).context("Failed to create usage store")?,
    );
    let history_store: Arc<dyn HistoryStore> = Arc::new(
        SqliteHistoryStore::new(&config.database.path)
            .context("Failed to create history store")?,
    );
    let telemetry_store: Arc<dyn TelemetryStore> = Arc::new(
        SqliteTelemetryStore::new(&config.database.path)
            .context("Failed to create telemetry store")?,
    );
    info!("Stores initialized");

    // Create telemetry system
    let (telemetry_handle, telemetry_writer) =
        create_telemetry_system(Arc::clone(&telemetry_store), TELEMETRY_BUFFER_SIZE);
    let writer_handle = tokio::spawn(telemetry_writer.run());

    telemetry_handle
        .emit(TelemetryEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;

    // Collaborators
    let storage: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::new(&config.storage));
    info!(
        "Object store: {} (bucket {})",
        storage.name(),
        config.storage.bucket
    );

    let compute: Arc<dyn ComputeService> = Arc::new(
        HttpComputeClient::new(&config.compute).context("Failed to create compute client")?,
    );
    info!(
        "Compute function {} at {}",
        config.compute.function_name, config.compute.endpoint
    );

    let notifier: Arc<dyn Notifier> = match &config.notifier {
        Some(notifier_config) => Arc::new(
            HttpEmailNotifier::new(notifier_config)
                .context("Failed to create email notifier")?,
        ),
        None => {
            warn!("No notifier configured, completion emails will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let orchestrator = Arc::new(ConversionOrchestrator::new(
        config.orchestrator.clone(),
        config.storage.bucket.clone(),
        config.compute.function_name.clone(),
        storage,
        compute,
        Arc::clone(&history_store),
    ));

    let ledger = UsageLedger::new(usage_store, config.plans.clone());
    let handler = SubtitleJobHandler::new(ledger.clone(), orchestrator)
        .with_telemetry(telemetry_handle.clone());

    // Queue and workers
    let queue: Arc<dyn JobQueue> = Arc::new(
        NatsJobQueue::connect(&config.queue)
            .await
            .context("Failed to connect to job queue")?,
    );

    let pool = Arc::new(
        WorkerPool::new(config.workers.clone(), queue, Arc::new(handler))
            .with_notifier(notifier)
            .with_telemetry(telemetry_handle.clone()),
    );
    pool.start().await.context("Failed to start worker pool")?;

    // Operational HTTP server
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&pool),
        ledger,
        history_store,
        telemetry_store,
    ));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let stop_server = Arc::new(Notify::new());
    let server_stop_signal = Arc::clone(&stop_server);
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_stop_signal.notified().await })
            .await
    });

    // Run until a signal arrives or the pool stops on its own
    let pool_for_wait = Arc::clone(&pool);
    let mut pool_done = tokio::spawn(async move { pool_for_wait.wait().await });

    let pool_result = tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received, waiting for in-flight jobs");
            pool.shutdown();
            (&mut pool_done).await
        }
        joined = &mut pool_done => joined,
    };

    let (reason, outcome) = match pool_result {
        Ok(Ok(())) => ("graceful_shutdown".to_string(), Ok(())),
        Ok(Err(e)) => {
            error!("Worker pool stopped: {}", e);
            (e.to_string(), Err(anyhow::Error::new(e)))
        }
        Err(e) => (
            format!("worker pool task failed: {}", e),
            Err(anyhow::anyhow!("Worker pool task failed: {}", e)),
        ),
    };

    stop_server.notify_one();
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Server error: {}", e),
        Err(e) => error!("Server task failed: {}", e),
    }

    info!("Shutting down...");
    telemetry_handle
        .emit(TelemetryEvent::ServiceStopped { reason })
        .await;

    // The writer exits once every TelemetryHandle clone is gone. The pool and
    // its handler hold clones; the router's copy went away with the server.
    drop(pool);
    drop(telemetry_handle);

    let _ = writer_handle.await;
    info!("Telemetry writer stopped");

    outcome.context("Worker pool stopped unexpectedly")
}

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
