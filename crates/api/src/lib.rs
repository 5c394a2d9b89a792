//! HTTP API server with observability for the allocation service.
//!
//! Provides endpoints for batch registration, allocation and the allocations
//! read model, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use repository::ProductRepository;
use service_layer::{Bootstrap, TracingEventPublisher, TracingMailer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::allocations::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R: ProductRepository + Clone + 'static>(
    state: Arc<AppState<R>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<R>))
        .route("/add_batch", post(routes::allocations::add_batch::<R>))
        .route("/allocate", post(routes::allocations::allocate::<R>))
        .route("/deallocate", post(routes::allocations::deallocate::<R>))
        .route(
            "/change_batch_quantity",
            post(routes::allocations::change_batch_quantity::<R>),
        )
        .route("/allocations/{order_id}", get(routes::allocations::list::<R>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state with logging adapters.
pub fn create_default_state<R: ProductRepository + Clone + 'static>(
    repository: R,
    config: &Config,
) -> Arc<AppState<R>> {
    let bootstrap = Bootstrap::new(
        repository,
        TracingEventPublisher,
        TracingMailer,
        config.bus_config(),
    );

    Arc::new(AppState { bootstrap })
}
