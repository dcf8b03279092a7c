//! API server entry point.

use api::config::{Config, LogFormat};
use event_stream::{EventSink, InMemoryEventSink, PostgresEventSink};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use store::{InMemoryStore, PostgresStore, Store};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve<S, K>(config: &Config, store: S, sink: K, metrics_handle: PrometheusHandle)
where
    S: Store + Clone + 'static,
    K: EventSink + 'static,
{
    let state = api::create_state(store, sink, config.stream_name.as_str());
    let app = api::create_app(
        state,
        metrics_handle,
        config.cors_allowed_origin.as_deref(),
    );

    let addr = config.addr();
    tracing::info!(%addr, stream = %config.stream_name, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    // 1. Load .env, then configuration
    let dotenv = dotenvy::dotenv();
    let config = Config::from_env().expect("invalid configuration");

    // 2. Initialize tracing
    init_tracing(&config);
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    // 3. Install Prometheus metrics recorder
    let metrics_handle =
        api::routes::metrics::install_recorder().expect("failed to install Prometheus recorder");

    // 4. Pick the gateway and sink, then serve
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .expect("failed to connect to PostgreSQL");

            let store = PostgresStore::new(pool.clone());
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!(
                max_connections = config.database_max_connections,
                "using PostgreSQL gateway and stream"
            );

            serve(&config, store, PostgresEventSink::new(pool), metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory gateway and stream");
            serve(
                &config,
                InMemoryStore::new(),
                InMemoryEventSink::new(),
                metrics_handle,
            )
            .await;
        }
    }

    tracing::info!("server shut down gracefully");
}
