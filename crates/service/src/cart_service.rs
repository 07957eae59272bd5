//! Cart command handling over the cart event streams.

use common::{StreamId, StreamType};
use domain::{Aggregate, CartAggregate, CartEvent, DomainError, DomainEvent};
use event_store::{AppendOptions, EventStore};

use crate::error::CommandError;

/// Orchestrates shopping-cart logic. Carts live entirely in their event
/// streams; no broker publish or projection is involved.
pub struct CartService<S> {
    store: S,
}

impl<S: EventStore> CartService<S> {
    /// Creates a new cart service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Appends an `ItemAddedToCart` event to the cart's stream.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: &str,
        product_id: &str,
        quantity: i64,
        price: f64,
    ) -> Result<(), CommandError> {
        let cart = self.load(cart_id).await?;

        let event = CartEvent::item_added(cart_id, product_id, quantity, price);
        self.store
            .append(
                cart.id(),
                StreamType::Cart,
                vec![event.to_new_event().map_err(DomainError::from)?],
                AppendOptions::expect_version(cart.version()),
            )
            .await?;

        Ok(())
    }

    /// Rebuilds the current state of a cart by replaying its stream.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<CartAggregate, CommandError> {
        self.load(cart_id).await
    }

    async fn load(&self, cart_id: &str) -> Result<CartAggregate, CommandError> {
        let stream = StreamId::new(cart_id);
        let records = self.store.load(&stream).await?;
        let mut cart = CartAggregate::new(stream);
        cart.rehydrate(&records)?;
        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;

    #[tokio::test]
    async fn adds_accumulate_across_events() {
        let store = InMemoryEventStore::new();
        let service = CartService::new(store.clone());

        service.add_item("C1", "prod-001", 1, 10.0).await.unwrap();
        service.add_item("C1", "prod-001", 2, 10.0).await.unwrap();

        let cart = service.get_cart("C1").await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items["prod-001"].quantity, 3);

        let records = store.load(&StreamId::new("C1")).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_type, "ItemAddedToCart");
        assert_eq!(records[1].version.as_i64(), 2);
    }

    #[tokio::test]
    async fn carts_are_isolated_by_stream() {
        let store = InMemoryEventStore::new();
        let service = CartService::new(store);

        service.add_item("C1", "prod-001", 1, 10.0).await.unwrap();
        service.add_item("C2", "prod-002", 5, 20.0).await.unwrap();

        let c1 = service.get_cart("C1").await.unwrap();
        let c2 = service.get_cart("C2").await.unwrap();
        assert_eq!(c1.items.len(), 1);
        assert!(c1.items.contains_key("prod-001"));
        assert_eq!(c2.items["prod-002"].quantity, 5);
    }

    #[tokio::test]
    async fn empty_cart_reads_as_empty() {
        let store = InMemoryEventStore::new();
        let service = CartService::new(store);

        let cart = service.get_cart("missing").await.unwrap();
        assert!(cart.items.is_empty());
    }
}
