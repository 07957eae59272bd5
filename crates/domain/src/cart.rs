//! Cart aggregate: a product-to-line mapping rebuilt from the cart stream.

use std::collections::HashMap;

use common::{StreamId, StreamType};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::event::DomainEvent;

/// Body of the `ItemAddedToCart` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemAddedToCartData {
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub price: f64,
}

/// Body of the `ItemRemovedFromCart` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRemovedFromCartData {
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i64,
}

/// Events that can occur on a cart stream.
#[derive(Debug, Clone)]
pub enum CartEvent {
    ItemAdded(ItemAddedToCartData),
    ItemRemoved(ItemRemovedFromCartData),
}

impl CartEvent {
    pub fn item_added(
        cart_id: impl Into<String>,
        product_id: impl Into<String>,
        quantity: i64,
        price: f64,
    ) -> Self {
        CartEvent::ItemAdded(ItemAddedToCartData {
            cart_id: cart_id.into(),
            product_id: product_id.into(),
            quantity,
            price,
        })
    }

    pub fn item_removed(
        cart_id: impl Into<String>,
        product_id: impl Into<String>,
        quantity: i64,
    ) -> Self {
        CartEvent::ItemRemoved(ItemRemovedFromCartData {
            cart_id: cart_id.into(),
            product_id: product_id.into(),
            quantity,
        })
    }
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::ItemAdded(_) => "ItemAddedToCart",
            CartEvent::ItemRemoved(_) => "ItemRemovedFromCart",
        }
    }

    fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            CartEvent::ItemAdded(data) => serde_json::to_value(data),
            CartEvent::ItemRemoved(data) => serde_json::to_value(data),
        }
    }

    fn from_payload(event_type: &str, payload: serde_json::Value) -> Result<Self, DomainError> {
        match event_type {
            "ItemAddedToCart" => Ok(CartEvent::ItemAdded(serde_json::from_value(payload)?)),
            "ItemRemovedFromCart" => Ok(CartEvent::ItemRemoved(serde_json::from_value(payload)?)),
            other => Err(DomainError::UnknownEventKind {
                aggregate: "CartAggregate",
                event_type: other.to_string(),
            }),
        }
    }
}

/// An item currently in a cart. The price is captured at the moment the
/// item was first added; later price changes need a fresh add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
    pub price: f64,
}

/// State of a shopping cart, rebuilt by replaying its stream.
///
/// Items whose quantity drops to zero or below leave the mapping.
#[derive(Debug, Clone)]
pub struct CartAggregate {
    id: StreamId,
    version: Version,
    pub items: HashMap<String, CartItem>,
}

impl Aggregate for CartAggregate {
    type Event = CartEvent;

    fn stream_type() -> StreamType {
        StreamType::Cart
    }

    fn new(id: StreamId) -> Self {
        Self {
            id,
            version: Version::initial(),
            items: HashMap::new(),
        }
    }

    fn id(&self) -> &StreamId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            CartEvent::ItemAdded(data) => {
                let quantity = match self.items.get(&data.product_id) {
                    Some(existing) => existing.quantity + data.quantity,
                    None => data.quantity,
                };
                if quantity <= 0 {
                    self.items.remove(&data.product_id);
                } else {
                    let price = self
                        .items
                        .get(&data.product_id)
                        .map(|existing| existing.price)
                        .unwrap_or(data.price);
                    self.items.insert(
                        data.product_id.clone(),
                        CartItem {
                            product_id: data.product_id,
                            quantity,
                            price,
                        },
                    );
                }
            }
            CartEvent::ItemRemoved(data) => {
                if let Some(item) = self.items.get_mut(&data.product_id) {
                    item.quantity -= data.quantity;
                    if item.quantity <= 0 {
                        self.items.remove(&data.product_id);
                    }
                }
            }
        }
        self.version = self.version.next();
    }
}
