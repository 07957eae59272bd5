//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use event_store::PostgresEventStore;
use messaging::KafkaBroker;
use projections::{PgOrderProjectionStore, PgProductCatalogue, ProductCatalogue, default_catalogue};
use service::{CartService, OrderService};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio_util::sync::CancellationToken;
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

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let config = Config::from_env();

    // 3. Database: pool, migrations, catalogue seed
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let store = PostgresEventStore::new(pool.clone());
    store.run_migrations().await.expect("migrations failed");
    tracing::info!("database connected and migrated");

    let catalogue = PgProductCatalogue::new(pool.clone());
    catalogue
        .seed(&default_catalogue())
        .await
        .expect("failed to seed product catalogue");

    let projection = PgOrderProjectionStore::new(pool);

    // 4. Broker and services
    let broker =
        KafkaBroker::new(config.kafka_brokers.as_str()).expect("failed to create kafka client");

    let orders = Arc::new(OrderService::new(
        store.clone(),
        broker.clone(),
        projection,
        catalogue,
    ));
    let carts = CartService::new(store);

    // 5. Start the broker consumers
    let shutdown = CancellationToken::new();
    let consumers = service::spawn_consumers(Arc::clone(&orders), broker, shutdown.clone());

    // 6. Build and serve the application
    let state = Arc::new(api::AppState { orders, carts });
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 7. Drain the consumers before exiting
    shutdown.cancel();
    for task in consumers {
        let _ = task.await;
    }

    tracing::info!("server shut down gracefully");
}
