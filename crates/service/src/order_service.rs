//! Order command handling: placement, confirmation, and queries.

use chrono::Utc;
use common::{StreamId, StreamType};
use domain::{
    Aggregate, DomainError, DomainEvent, InventoryAggregate, InventoryEvent, OrderAggregate,
    OrderConfirmedData, OrderEvent, OrderItem, OrderPlacedData, OrderStatus,
};
use event_store::{AppendOptions, EventStore, EventStoreError, Version};
use messaging::{EventPublisher, EventPublisherExt};
use projections::{OrderProjection, OrderProjectionStore, Product, ProductCatalogue};

use crate::commands::PlaceOrder;
use crate::consumers::{TOPIC_ORDER_CONFIRMED, TOPIC_ORDER_PLACED};
use crate::error::CommandError;

/// Orchestrates order-related business logic over the event store, the
/// broker, and the read model.
pub struct OrderService<S, B, R, C> {
    store: S,
    publisher: B,
    projection: R,
    catalogue: C,
}

impl<S, B, R, C> OrderService<S, B, R, C>
where
    S: EventStore,
    B: EventPublisher,
    R: OrderProjectionStore,
    C: ProductCatalogue,
{
    /// Creates a new order service.
    pub fn new(store: S, publisher: B, projection: R, catalogue: C) -> Self {
        Self {
            store,
            publisher,
            projection,
            catalogue,
        }
    }

    /// Places an order: reserves inventory, appends `OrderPlaced`, and
    /// publishes it.
    ///
    /// Replays are reported as success: a non-empty order stream means
    /// the command already ran, and a concurrency loss on the final
    /// append means a concurrent duplicate won the race.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn place_order(&self, cmd: &PlaceOrder) -> Result<(), CommandError> {
        if cmd.items.is_empty() {
            return Err(CommandError::InvalidCommand(
                "order must have at least one item".to_string(),
            ));
        }

        let order_stream = StreamId::new(cmd.order_id.as_str());
        let records = self.store.load(&order_stream).await?;
        if !records.is_empty() {
            tracing::info!("order already exists, treating replay as success");
            return Ok(());
        }

        // Check availability for every product before reserving anything,
        // summing quantities when a product appears in several items.
        let mut requested: Vec<(String, i64)> = Vec::new();
        for item in &cmd.items {
            match requested.iter_mut().find(|(id, _)| id == &item.product_id) {
                Some((_, quantity)) => *quantity += i64::from(item.quantity),
                None => requested.push((item.product_id.clone(), i64::from(item.quantity))),
            }
        }

        let mut next_expected: Vec<(String, Version)> = Vec::new();
        for (product_id, quantity) in &requested {
            let inventory_stream = StreamId::new(product_id.as_str());
            let history = self.store.load(&inventory_stream).await?;
            // The synthetic bootstrap below is never persisted, so the
            // append must expect the version of the real history only.
            let real_version = Version::new(history.len() as i64);

            let mut inventory = InventoryAggregate::new(inventory_stream);
            if let Some(product) = self.catalogue.find(product_id).await? {
                inventory.apply(InventoryEvent::stock_updated(
                    product_id.as_str(),
                    product.stock,
                ));
            }
            inventory.rehydrate(&history)?;

            if inventory.available() < *quantity {
                return Err(CommandError::InsufficientStock {
                    product_id: product_id.clone(),
                    available: inventory.available(),
                    requested: *quantity,
                });
            }
            next_expected.push((product_id.clone(), real_version));
        }

        for item in &cmd.items {
            let inventory_stream = StreamId::new(item.product_id.as_str());
            let expected = next_expected
                .iter_mut()
                .find(|(id, _)| id == &item.product_id)
                .map(|(_, v)| v)
                .expect("every item product was availability-checked");

            let event = InventoryEvent::reserved(
                cmd.order_id.as_str(),
                item.product_id.as_str(),
                i64::from(item.quantity),
            );
            let appended = self
                .store
                .append(
                    &inventory_stream,
                    StreamType::Inventory,
                    vec![event.to_new_event().map_err(DomainError::from)?],
                    AppendOptions::expect_version(*expected),
                )
                .await?;
            *expected = appended;
        }

        let total_price: f64 = cmd.items.iter().map(OrderItem::line_total).sum();
        let data = OrderPlacedData {
            order_id: cmd.order_id.clone(),
            items: cmd.items.clone(),
            total_price,
            placed_at: Utc::now(),
        };
        let event = OrderEvent::Placed(data.clone());

        match self
            .store
            .append(
                &order_stream,
                StreamType::Order,
                vec![event.to_new_event().map_err(DomainError::from)?],
                AppendOptions::expect_new(),
            )
            .await
        {
            Ok(_) => {}
            Err(EventStoreError::ConcurrencyConflict { .. }) => {
                tracing::info!("concurrent duplicate placement, reporting success");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        self.publisher
            .publish_event(TOPIC_ORDER_PLACED, &cmd.order_id, &data)
            .await?;

        metrics::counter!("orders_placed").increment(1);
        tracing::info!(total_price, "order placed");
        Ok(())
    }

    /// Handles a delivered `OrderPlaced`: updates the projection, then
    /// appends and publishes the confirmation. Idempotent under
    /// redelivery.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    pub async fn handle_order_placed(&self, event: &OrderPlacedData) -> Result<(), CommandError> {
        self.projection.upsert_placed(event).await?;

        let order_stream = StreamId::new(event.order_id.as_str());
        let mut retried = false;

        loop {
            let records = self.store.load(&order_stream).await?;
            if records.is_empty() {
                return Err(CommandError::OrderNotFound {
                    order_id: event.order_id.clone(),
                });
            }

            let mut order = OrderAggregate::new(order_stream.clone());
            order.rehydrate(&records)?;
            if order.status == OrderStatus::Confirmed {
                tracing::info!("order already confirmed");
                return Ok(());
            }

            let data = OrderConfirmedData {
                order_id: event.order_id.clone(),
                confirmed_at: Utc::now(),
            };
            let confirm = OrderEvent::Confirmed(data.clone());

            match self
                .store
                .append(
                    &order_stream,
                    StreamType::Order,
                    vec![confirm.to_new_event().map_err(DomainError::from)?],
                    AppendOptions::expect_version(order.version()),
                )
                .await
            {
                Ok(_) => {
                    self.publisher
                        .publish_event(TOPIC_ORDER_CONFIRMED, &event.order_id, &data)
                        .await?;
                    metrics::counter!("orders_confirmed").increment(1);
                    tracing::info!("order confirmed");
                    return Ok(());
                }
                Err(EventStoreError::ConcurrencyConflict { .. }) if !retried => {
                    retried = true;
                    tracing::warn!("confirmation lost a concurrent append, reloading once");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Handles a delivered `OrderConfirmed`: advances the projection row.
    /// Idempotent under redelivery.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    pub async fn handle_order_confirmed(
        &self,
        event: &OrderConfirmedData,
    ) -> Result<(), CommandError> {
        self.projection.mark_confirmed(&event.order_id).await?;
        Ok(())
    }

    /// Returns all catalogue products.
    pub async fn products(&self) -> Result<Vec<Product>, CommandError> {
        Ok(self.catalogue.list().await?)
    }

    /// Returns the latest orders from the projection.
    pub async fn recent_orders(&self, limit: usize) -> Result<Vec<OrderProjection>, CommandError> {
        Ok(self.projection.list_recent(limit).await?)
    }
}
