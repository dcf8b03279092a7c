//! HTTP API server for customers and the work order lifecycle.
//!
//! Provides REST endpoints under `/api/v1` for customer management and the
//! work order lifecycle, with structured logging (tracing) and Prometheus
//! metrics on `/metrics`.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, patch, post};
use domain::{CustomerService, WorkOrderService};
use event_stream::EventSink;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store, K: EventSink> {
    pub customers: CustomerService<S>,
    pub work_orders: WorkOrderService<S, K>,
}

/// Wires both services over one gateway and one event sink.
pub fn create_state<S: Store + Clone, K: EventSink>(
    store: S,
    sink: K,
    stream_name: impl Into<String>,
) -> Arc<AppState<S, K>> {
    Arc::new(AppState {
        customers: CustomerService::new(store.clone()),
        work_orders: WorkOrderService::new(store, sink, stream_name),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static, K: EventSink + 'static>(
    state: Arc<AppState<S, K>>,
    metrics_handle: PrometheusHandle,
    cors_allowed_origin: Option<&str>,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/customers",
            post(routes::customers::create::<S, K>).get(routes::customers::list::<S, K>),
        )
        .route("/customers/active", get(routes::customers::active::<S, K>))
        .route(
            "/customers/{id}",
            get(routes::customers::get::<S, K>).put(routes::customers::update::<S, K>),
        )
        .route(
            "/customers/{id}/work-orders",
            get(routes::customers::work_orders::<S, K>),
        )
        .route(
            "/work-orders",
            post(routes::work_orders::create::<S, K>).get(routes::work_orders::list::<S, K>),
        )
        .route("/work-orders/{id}", get(routes::work_orders::get::<S, K>))
        .route(
            "/work-orders/{id}/complete",
            patch(routes::work_orders::complete::<S, K>),
        )
        .route(
            "/work-orders/{id}/completion",
            get(routes::work_orders::completion::<S, K>),
        )
        .route(
            "/work-orders/{id}/republish",
            post(routes::work_orders::republish::<S, K>),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api)
        .merge(metrics_router)
        .layer(cors_layer(cors_allowed_origin))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let origin = match allowed_origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "invalid CORS_ALLOWED_ORIGIN, allowing any origin");
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
