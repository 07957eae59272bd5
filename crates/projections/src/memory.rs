//! In-memory read-model implementations for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::OrderPlacedData;
use tokio::sync::RwLock;

use crate::Result;
use crate::orders::{OrderProjection, OrderProjectionStore, clamp_limit};
use crate::product::{Product, ProductCatalogue};

/// In-memory product catalogue for testing.
#[derive(Clone, Default)]
pub struct InMemoryProductCatalogue {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryProductCatalogue {
    /// Creates an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalogue pre-populated with the given products.
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }
}

#[async_trait]
impl ProductCatalogue for InMemoryProductCatalogue {
    async fn list(&self) -> Result<Vec<Product>> {
        let mut products = self.products.read().await.clone();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn find(&self, product_id: &str) -> Result<Option<Product>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| p.id == product_id)
            .cloned())
    }

    async fn seed(&self, products: &[Product]) -> Result<()> {
        let mut stored = self.products.write().await;
        if stored.is_empty() {
            stored.extend_from_slice(products);
        }
        Ok(())
    }
}

/// In-memory orders projection for testing.
#[derive(Clone, Default)]
pub struct InMemoryOrderProjectionStore {
    orders: Arc<RwLock<HashMap<String, OrderProjection>>>,
}

impl InMemoryOrderProjectionStore {
    /// Creates an empty projection store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the projected row for one order.
    pub async fn get(&self, order_id: &str) -> Option<OrderProjection> {
        self.orders.read().await.get(order_id).cloned()
    }

    /// Returns the number of projected rows.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns true when no rows have been projected.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderProjectionStore for InMemoryOrderProjectionStore {
    async fn upsert_placed(&self, event: &OrderPlacedData) -> Result<()> {
        let mut orders = self.orders.write().await;
        let status = orders
            .get(&event.order_id)
            .filter(|existing| existing.status == "confirmed")
            .map(|existing| existing.status.clone())
            .unwrap_or_else(|| "placed".to_string());

        orders.insert(
            event.order_id.clone(),
            OrderProjection {
                id: event.order_id.clone(),
                total_price: event.total_price,
                status,
                created_at: event.placed_at,
                items: event.items.clone(),
            },
        );
        Ok(())
    }

    async fn mark_confirmed(&self, order_id: &str) -> Result<()> {
        if let Some(order) = self.orders.write().await.get_mut(order_id) {
            order.status = "confirmed".to_string();
        }
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<OrderProjection>> {
        let mut orders: Vec<OrderProjection> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(clamp_limit(limit) as usize);
        Ok(orders)
    }
}
