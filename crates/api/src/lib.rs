//! HTTP API server for the event-sourced storefront.
//!
//! Exposes the thin command/query surface over the service layer, with
//! structured logging (tracing) and Prometheus metrics. CORS is open so
//! the storefront frontend can connect from anywhere.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use event_store::EventStore;
use messaging::EventPublisher;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{OrderProjectionStore, ProductCatalogue};
use service::{CartService, OrderService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S, B, R, C> {
    pub orders: Arc<OrderService<S, B, R, C>>,
    pub carts: CartService<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, B, R, C>(
    state: Arc<AppState<S, B, R, C>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: EventStore + 'static,
    B: EventPublisher + 'static,
    R: OrderProjectionStore + 'static,
    C: ProductCatalogue + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/products", get(routes::products::list::<S, B, R, C>))
        .route("/api/orders", post(routes::orders::create::<S, B, R, C>))
        .route("/api/orders", get(routes::orders::list::<S, B, R, C>))
        .route("/api/cart/{id}", get(routes::cart::get_cart::<S, B, R, C>))
        .route("/api/cart/{id}/items", post(routes::cart::add_item::<S, B, R, C>))
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
