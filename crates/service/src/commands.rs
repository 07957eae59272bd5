//! Commands accepted by the pipeline.

use domain::OrderItem;
use serde::{Deserialize, Serialize};

/// Command to place a new order.
///
/// Arrives either from the HTTP ingress or as a message on the
/// `orders.commands` topic; both paths carry the same JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: String,
    pub items: Vec<OrderItem>,
}

impl PlaceOrder {
    pub fn new(order_id: impl Into<String>, items: Vec<OrderItem>) -> Self {
        Self {
            order_id: order_id.into(),
            items,
        }
    }
}
