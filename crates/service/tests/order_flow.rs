//! End-to-end flow tests for the command pipeline, driven against the
//! in-memory store, broker, and read model.

use common::StreamId;
use domain::{OrderItem, OrderPlacedData};
use event_store::{EventStore, EventStoreError, InMemoryEventStore};
use messaging::InMemoryBroker;
use projections::{
    InMemoryOrderProjectionStore, InMemoryProductCatalogue, Product,
};
use service::{
    CartService, CommandError, OrderService, PlaceOrder, TOPIC_ORDER_CONFIRMED,
    TOPIC_ORDER_PLACED,
};

type TestOrderService = OrderService<
    InMemoryEventStore,
    InMemoryBroker,
    InMemoryOrderProjectionStore,
    InMemoryProductCatalogue,
>;

struct TestApp {
    store: InMemoryEventStore,
    broker: InMemoryBroker,
    projection: InMemoryOrderProjectionStore,
    orders: TestOrderService,
}

fn product(id: &str, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        description: String::new(),
        price: 10.0,
        image_url: String::new(),
        category: "Test".to_string(),
        stock,
    }
}

fn setup(products: Vec<Product>) -> TestApp {
    let store = InMemoryEventStore::new();
    let broker = InMemoryBroker::new();
    let projection = InMemoryOrderProjectionStore::new();
    let catalogue = InMemoryProductCatalogue::with_products(products);

    let orders = OrderService::new(
        store.clone(),
        broker.clone(),
        projection.clone(),
        catalogue,
    );

    TestApp {
        store,
        broker,
        projection,
        orders,
    }
}

fn placed_message(app: &TestApp, index: usize) -> (String, OrderPlacedData) {
    let messages = app.broker.published(TOPIC_ORDER_PLACED);
    let (key, payload) = &messages[index];
    (key.clone(), serde_json::from_slice(payload).unwrap())
}

#[tokio::test]
async fn happy_path_appends_reserves_and_publishes() {
    let app = setup(vec![product("prod-001", 50)]);

    let cmd = PlaceOrder::new(
        "order-1",
        vec![OrderItem::new("prod-001", "H", 10.0, 3)],
    );
    app.orders.place_order(&cmd).await.unwrap();

    // One OrderPlaced at version 1 with the computed total.
    let order_records = app.store.load(&StreamId::new("order-1")).await.unwrap();
    assert_eq!(order_records.len(), 1);
    assert_eq!(order_records[0].event_type, "OrderPlaced");
    assert_eq!(order_records[0].version.as_i64(), 1);
    let total = order_records[0].payload["total_price"].as_f64().unwrap();
    assert!((total - 30.0).abs() < 1e-9);

    // One InventoryReserved for the product.
    let inventory_records = app.store.load(&StreamId::new("prod-001")).await.unwrap();
    assert_eq!(inventory_records.len(), 1);
    assert_eq!(inventory_records[0].event_type, "InventoryReserved");
    assert_eq!(inventory_records[0].payload["quantity"], 3);

    // One message on orders.placed, keyed by the order id.
    let (key, event) = placed_message(&app, 0);
    assert_eq!(app.broker.published_count(TOPIC_ORDER_PLACED), 1);
    assert_eq!(key, "order-1");
    assert_eq!(event.order_id, "order-1");
    assert!((event.total_price - 30.0).abs() < 1e-9);
}

#[tokio::test]
async fn command_redelivery_is_idempotent() {
    let app = setup(vec![product("prod-001", 50)]);

    let cmd = PlaceOrder::new(
        "order-1",
        vec![OrderItem::new("prod-001", "H", 10.0, 3)],
    );
    app.orders.place_order(&cmd).await.unwrap();
    app.orders.place_order(&cmd).await.unwrap();

    assert_eq!(app.store.load(&StreamId::new("order-1")).await.unwrap().len(), 1);
    assert_eq!(app.store.load(&StreamId::new("prod-001")).await.unwrap().len(), 1);
    assert_eq!(app.broker.published_count(TOPIC_ORDER_PLACED), 1);
}

#[tokio::test]
async fn empty_items_are_rejected() {
    let app = setup(vec![product("prod-001", 50)]);

    let cmd = PlaceOrder::new("order-1", vec![]);
    let err = app.orders.place_order(&cmd).await.unwrap_err();

    assert!(matches!(err, CommandError::InvalidCommand(_)));
    assert_eq!(app.store.load(&StreamId::new("order-1")).await.unwrap().len(), 0);
}

#[tokio::test]
async fn insufficient_stock_appends_nothing() {
    let app = setup(vec![product("prod-x", 2)]);

    let cmd = PlaceOrder::new("order-1", vec![OrderItem::new("prod-x", "X", 5.0, 3)]);
    let err = app.orders.place_order(&cmd).await.unwrap_err();

    match err {
        CommandError::InsufficientStock {
            product_id,
            available,
            requested,
        } => {
            assert_eq!(product_id, "prod-x");
            assert_eq!(available, 2);
            assert_eq!(requested, 3);
        }
        other => panic!("expected InsufficientStock, got {other}"),
    }

    assert_eq!(app.store.load(&StreamId::new("order-1")).await.unwrap().len(), 0);
    assert_eq!(app.store.load(&StreamId::new("prod-x")).await.unwrap().len(), 0);
    assert_eq!(app.broker.published_count(TOPIC_ORDER_PLACED), 0);
}

#[tokio::test]
async fn shortfall_on_any_product_reserves_nothing() {
    let app = setup(vec![product("prod-001", 50), product("prod-002", 1)]);

    let cmd = PlaceOrder::new(
        "order-1",
        vec![
            OrderItem::new("prod-001", "A", 10.0, 3),
            OrderItem::new("prod-002", "B", 20.0, 2),
        ],
    );
    let err = app.orders.place_order(&cmd).await.unwrap_err();
    assert!(matches!(err, CommandError::InsufficientStock { .. }));

    // No partial reservation: the in-stock product stays untouched too.
    assert_eq!(app.store.load(&StreamId::new("prod-001")).await.unwrap().len(), 0);
    assert_eq!(app.store.load(&StreamId::new("prod-002")).await.unwrap().len(), 0);
}

#[tokio::test]
async fn repeated_product_quantities_are_summed_for_the_check() {
    let app = setup(vec![product("prod-001", 5)]);

    // 3 + 3 exceeds the stock of 5 even though each line alone fits.
    let cmd = PlaceOrder::new(
        "order-1",
        vec![
            OrderItem::new("prod-001", "A", 10.0, 3),
            OrderItem::new("prod-001", "A", 10.0, 3),
        ],
    );
    let err = app.orders.place_order(&cmd).await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::InsufficientStock { requested: 6, .. }
    ));

    // A fitting double-line order reserves once per item line.
    let cmd = PlaceOrder::new(
        "order-2",
        vec![
            OrderItem::new("prod-001", "A", 10.0, 2),
            OrderItem::new("prod-001", "A", 10.0, 2),
        ],
    );
    app.orders.place_order(&cmd).await.unwrap();
    let records = app.store.load(&StreamId::new("prod-001")).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].version.as_i64(), 2);
}

#[tokio::test]
async fn reservations_count_against_later_orders() {
    let app = setup(vec![product("prod-001", 5)]);

    let first = PlaceOrder::new("order-1", vec![OrderItem::new("prod-001", "A", 10.0, 4)]);
    app.orders.place_order(&first).await.unwrap();

    // 4 of 5 are reserved; a request for 2 more must fail.
    let second = PlaceOrder::new("order-2", vec![OrderItem::new("prod-001", "A", 10.0, 2)]);
    let err = app.orders.place_order(&second).await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::InsufficientStock {
            available: 1,
            requested: 2,
            ..
        }
    ));
}

#[tokio::test]
async fn confirmation_chain_advances_stream_and_projection() {
    let app = setup(vec![product("prod-001", 50)]);

    let cmd = PlaceOrder::new("order-1", vec![OrderItem::new("prod-001", "H", 10.0, 3)]);
    app.orders.place_order(&cmd).await.unwrap();

    // Deliver the published OrderPlaced back through the handler.
    let (_, placed) = placed_message(&app, 0);
    app.orders.handle_order_placed(&placed).await.unwrap();

    let records = app.store.load(&StreamId::new("order-1")).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].event_type, "OrderConfirmed");
    assert_eq!(records[1].version.as_i64(), 2);
    assert_eq!(app.broker.published_count(TOPIC_ORDER_CONFIRMED), 1);

    // Projection row was created by the placed handler...
    let row = app.projection.get("order-1").await.unwrap();
    assert_eq!(row.status, "placed");
    assert!((row.total_price - 30.0).abs() < 1e-9);

    // ...and transitions once the confirmed topic is consumed.
    let (key, payload) = app.broker.published(TOPIC_ORDER_CONFIRMED)[0].clone();
    assert_eq!(key, "order-1");
    let confirmed = serde_json::from_slice(&payload).unwrap();
    app.orders.handle_order_confirmed(&confirmed).await.unwrap();
    assert_eq!(app.projection.get("order-1").await.unwrap().status, "confirmed");
}

#[tokio::test]
async fn placed_redelivery_confirms_exactly_once() {
    let app = setup(vec![product("prod-001", 50)]);

    let cmd = PlaceOrder::new("order-1", vec![OrderItem::new("prod-001", "H", 10.0, 3)]);
    app.orders.place_order(&cmd).await.unwrap();

    let (_, placed) = placed_message(&app, 0);
    app.orders.handle_order_placed(&placed).await.unwrap();
    app.orders.handle_order_placed(&placed).await.unwrap();

    // Still exactly one OrderConfirmed event and one published fact.
    let records = app.store.load(&StreamId::new("order-1")).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(app.broker.published_count(TOPIC_ORDER_CONFIRMED), 1);
    assert_eq!(app.projection.len().await, 1);
}

#[tokio::test]
async fn concurrent_placed_handlers_confirm_exactly_once() {
    let app = setup(vec![product("prod-001", 50)]);

    let cmd = PlaceOrder::new("order-1", vec![OrderItem::new("prod-001", "H", 10.0, 3)]);
    app.orders.place_order(&cmd).await.unwrap();
    let (_, placed) = placed_message(&app, 0);

    let (a, b) = tokio::join!(
        app.orders.handle_order_placed(&placed),
        app.orders.handle_order_placed(&placed),
    );
    a.unwrap();
    b.unwrap();

    let records = app.store.load(&StreamId::new("order-1")).await.unwrap();
    assert_eq!(records.len(), 2, "exactly one confirmation may land");
    assert_eq!(app.broker.published_count(TOPIC_ORDER_CONFIRMED), 1);
}

#[tokio::test]
async fn placed_handler_without_order_stream_reports_not_found() {
    let app = setup(vec![product("prod-001", 50)]);

    let event = OrderPlacedData {
        order_id: "ghost".to_string(),
        items: vec![OrderItem::new("prod-001", "H", 10.0, 1)],
        total_price: 10.0,
        placed_at: chrono::Utc::now(),
    };

    let err = app.orders.handle_order_placed(&event).await.unwrap_err();
    assert!(matches!(err, CommandError::OrderNotFound { .. }));
}

#[tokio::test]
async fn concurrent_duplicate_placement_writes_one_order_event() {
    let app = setup(vec![product("prod-001", 50)]);

    let cmd = PlaceOrder::new("order-1", vec![OrderItem::new("prod-001", "H", 10.0, 3)]);
    let (a, b) = tokio::join!(app.orders.place_order(&cmd), app.orders.place_order(&cmd));

    for result in [a, b] {
        match result {
            Ok(()) => {}
            // A loser surfacing a version conflict is transient: the
            // command topic redelivers and the retry short-circuits.
            Err(CommandError::EventStore(EventStoreError::ConcurrencyConflict { .. })) => {}
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }

    let records = app.store.load(&StreamId::new("order-1")).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn total_price_matches_sum_within_tolerance() {
    let app = setup(vec![product("prod-001", 100), product("prod-002", 100)]);

    let items = vec![
        OrderItem::new("prod-001", "A", 0.1, 3),
        OrderItem::new("prod-002", "B", 19.99, 7),
    ];
    let expected: f64 = items.iter().map(|i| i.price * f64::from(i.quantity)).sum();

    let cmd = PlaceOrder::new("order-1", items);
    app.orders.place_order(&cmd).await.unwrap();

    let (_, placed) = placed_message(&app, 0);
    assert!((placed.total_price - expected).abs() < 1e-9);
}

#[tokio::test]
async fn cart_adds_accumulate_into_one_line() {
    let store = InMemoryEventStore::new();
    let carts = CartService::new(store.clone());

    carts.add_item("C1", "prod-001", 1, 10.0).await.unwrap();
    carts.add_item("C1", "prod-001", 2, 10.0).await.unwrap();

    let cart = carts.get_cart("C1").await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items["prod-001"].quantity, 3);

    let records = store.load(&StreamId::new("C1")).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].version.as_i64(), 1);
    assert_eq!(records[1].version.as_i64(), 2);
}
