//! Integration tests for the API server against in-memory backends.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::StreamId;
use event_store::{EventStore, InMemoryEventStore};
use messaging::InMemoryBroker;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{
    InMemoryOrderProjectionStore, InMemoryProductCatalogue, ProductCatalogue, default_catalogue,
};
use service::{CartService, OrderService, TOPIC_ORDER_PLACED};
use tower::ServiceExt;

type TestState = api::AppState<
    InMemoryEventStore,
    InMemoryBroker,
    InMemoryOrderProjectionStore,
    InMemoryProductCatalogue,
>;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    router: axum::Router,
    state: Arc<TestState>,
    store: InMemoryEventStore,
    broker: InMemoryBroker,
}

async fn setup() -> TestApp {
    let store = InMemoryEventStore::new();
    let broker = InMemoryBroker::new();
    let projection = InMemoryOrderProjectionStore::new();
    let catalogue = InMemoryProductCatalogue::new();
    catalogue.seed(&default_catalogue()).await.unwrap();

    let orders = Arc::new(OrderService::new(
        store.clone(),
        broker.clone(),
        projection,
        catalogue,
    ));
    let carts = CartService::new(store.clone());

    let state = Arc::new(api::AppState { orders, carts });
    let router = api::create_app(Arc::clone(&state), get_metrics_handle());

    TestApp {
        router,
        state,
        store,
        broker,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_check_reports_ok() {
    let app = setup().await;

    let response = app
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn products_lists_the_seeded_catalogue() {
    let app = setup().await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let products = json.as_array().unwrap();
    assert_eq!(products.len(), default_catalogue().len());
    assert!(products.iter().any(|p| p["id"] == "prod-001"));
}

#[tokio::test]
async fn create_order_places_and_publishes() {
    let app = setup().await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/orders",
            serde_json::json!({
                "items": [{"product_id": "prod-001", "name": "H", "price": 10.0, "quantity": 3}]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "placed");
    let order_id = json["order_id"].as_str().unwrap().to_string();

    let records = app.store.load(&StreamId::new(order_id.as_str())).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_type, "OrderPlaced");

    let published = app.broker.published(TOPIC_ORDER_PLACED);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, order_id);
}

#[tokio::test]
async fn create_order_with_no_items_is_bad_request() {
    let app = setup().await;

    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/orders",
            serde_json::json!({"items": []}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("at least one item"));
}

#[tokio::test]
async fn create_order_beyond_stock_conflicts() {
    let app = setup().await;

    // prod-004 seeds with stock 25.
    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/orders",
            serde_json::json!({
                "items": [{"product_id": "prod-004", "name": "Chair", "price": 549.99, "quantity": 26}]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("insufficient stock"));
}

#[tokio::test]
async fn list_orders_reflects_the_confirmation_chain() {
    let app = setup().await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/orders",
            serde_json::json!({
                "items": [{"product_id": "prod-001", "name": "H", "price": 10.0, "quantity": 3}]
            }),
        ))
        .await
        .unwrap();
    let order_id = body_json(response).await["order_id"]
        .as_str()
        .unwrap()
        .to_string();

    // Drive the broker-driven handlers the way the consumers would.
    let (_, payload) = app.broker.published(TOPIC_ORDER_PLACED)[0].clone();
    let placed: domain::OrderPlacedData = serde_json::from_slice(&payload).unwrap();
    app.state.orders.handle_order_placed(&placed).await.unwrap();
    app.state
        .orders
        .handle_order_confirmed(&domain::OrderConfirmedData {
            order_id: order_id.clone(),
            confirmed_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/orders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let orders = json.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order_id.as_str());
    assert_eq!(orders[0]["status"], "confirmed");
    assert_eq!(orders[0]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cart_accumulates_across_posts() {
    let app = setup().await;

    for quantity in [1, 2] {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/cart/C1/items",
                serde_json::json!({"product_id": "prod-001", "quantity": quantity, "price": 10.0}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/cart/C1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(items[0]["product_id"], "prod-001");

    let records = app.store.load(&StreamId::new("C1")).await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn unknown_cart_reads_as_empty() {
    let app = setup().await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/cart/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}
