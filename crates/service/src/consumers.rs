//! Broker consumer wiring: three topics, three independent groups.
//!
//! Each consumer owns one long-lived task so the projections advance
//! independently; all of them share one shutdown token.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{OrderConfirmedData, OrderPlacedData};
use event_store::EventStore;
use messaging::{EventPublisher, EventSubscriber, HandlerError, MessageHandler};
use projections::{OrderProjectionStore, ProductCatalogue};
use tokio_util::sync::CancellationToken;

use crate::commands::PlaceOrder;
use crate::order_service::OrderService;

/// Topic carrying `PlaceOrder` commands from the ingress.
pub const TOPIC_ORDER_COMMANDS: &str = "orders.commands";

/// Topic carrying `OrderPlaced` facts.
pub const TOPIC_ORDER_PLACED: &str = "orders.placed";

/// Topic carrying `OrderConfirmed` facts.
pub const TOPIC_ORDER_CONFIRMED: &str = "orders.confirmed";

/// Consumer group executing `PlaceOrder` commands.
pub const GROUP_COMMANDS: &str = "ecommerce-commands";

/// Consumer group driving the confirmation chain.
pub const GROUP_PLACED: &str = "ecommerce-placed";

/// Consumer group advancing the confirmed projection.
pub const GROUP_CONFIRMED_PROJECTION: &str = "ecommerce-confirmed-projection";

struct PlaceOrderHandler<S, B, R, C> {
    service: Arc<OrderService<S, B, R, C>>,
}

#[async_trait]
impl<S, B, R, C> MessageHandler for PlaceOrderHandler<S, B, R, C>
where
    S: EventStore + 'static,
    B: EventPublisher + 'static,
    R: OrderProjectionStore + 'static,
    C: ProductCatalogue + 'static,
{
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError> {
        let cmd: PlaceOrder = serde_json::from_slice(payload)?;
        self.service.place_order(&cmd).await?;
        Ok(())
    }
}

struct OrderPlacedHandler<S, B, R, C> {
    service: Arc<OrderService<S, B, R, C>>,
}

#[async_trait]
impl<S, B, R, C> MessageHandler for OrderPlacedHandler<S, B, R, C>
where
    S: EventStore + 'static,
    B: EventPublisher + 'static,
    R: OrderProjectionStore + 'static,
    C: ProductCatalogue + 'static,
{
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError> {
        let event: OrderPlacedData = serde_json::from_slice(payload)?;
        self.service.handle_order_placed(&event).await?;
        Ok(())
    }
}

struct OrderConfirmedHandler<S, B, R, C> {
    service: Arc<OrderService<S, B, R, C>>,
}

#[async_trait]
impl<S, B, R, C> MessageHandler for OrderConfirmedHandler<S, B, R, C>
where
    S: EventStore + 'static,
    B: EventPublisher + 'static,
    R: OrderProjectionStore + 'static,
    C: ProductCatalogue + 'static,
{
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError> {
        let event: OrderConfirmedData = serde_json::from_slice(payload)?;
        self.service.handle_order_confirmed(&event).await?;
        Ok(())
    }
}

fn spawn_consumer<Sub>(
    subscriber: Sub,
    topic: &'static str,
    group: &'static str,
    shutdown: CancellationToken,
    handler: Arc<dyn MessageHandler>,
) -> tokio::task::JoinHandle<()>
where
    Sub: EventSubscriber + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = subscriber.consume(topic, group, shutdown, handler).await {
            tracing::error!(topic, group, error = %e, "consumer terminated");
        }
    })
}

/// Starts the three consumer tasks and returns their join handles.
///
/// The caller cancels `shutdown` to drain them; each task exits cleanly
/// once its in-flight message finishes.
pub fn spawn_consumers<S, B, R, C, Sub>(
    service: Arc<OrderService<S, B, R, C>>,
    subscriber: Sub,
    shutdown: CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>>
where
    S: EventStore + 'static,
    B: EventPublisher + 'static,
    R: OrderProjectionStore + 'static,
    C: ProductCatalogue + 'static,
    Sub: EventSubscriber + Clone + 'static,
{
    vec![
        spawn_consumer(
            subscriber.clone(),
            TOPIC_ORDER_COMMANDS,
            GROUP_COMMANDS,
            shutdown.clone(),
            Arc::new(PlaceOrderHandler {
                service: Arc::clone(&service),
            }),
        ),
        spawn_consumer(
            subscriber.clone(),
            TOPIC_ORDER_PLACED,
            GROUP_PLACED,
            shutdown.clone(),
            Arc::new(OrderPlacedHandler {
                service: Arc::clone(&service),
            }),
        ),
        spawn_consumer(
            subscriber,
            TOPIC_ORDER_CONFIRMED,
            GROUP_CONFIRMED_PROJECTION,
            shutdown,
            Arc::new(OrderConfirmedHandler { service }),
        ),
    ]
}
