//! Order aggregate: placed by a command, confirmed by the broker chain.

use chrono::{DateTime, Utc};
use common::{StreamId, StreamType};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::event::DomainEvent;

/// A line item within an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Returns the total price for this line (price × quantity).
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// No events applied yet; the in-memory starting point.
    #[default]
    Pending,

    /// The order has been placed and inventory reserved.
    Placed,

    /// The confirmation step has run.
    Confirmed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Placed => "placed",
            OrderStatus::Confirmed => "confirmed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of the `OrderPlaced` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: String,
    pub items: Vec<OrderItem>,
    pub total_price: f64,
    pub placed_at: DateTime<Utc>,
}

/// Body of the `OrderConfirmed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfirmedData {
    pub order_id: String,
    pub confirmed_at: DateTime<Utc>,
}

/// Events that can occur on an order stream.
#[derive(Debug, Clone)]
pub enum OrderEvent {
    Placed(OrderPlacedData),
    Confirmed(OrderConfirmedData),
}

impl OrderEvent {
    pub fn placed(
        order_id: impl Into<String>,
        items: Vec<OrderItem>,
        total_price: f64,
        placed_at: DateTime<Utc>,
    ) -> Self {
        OrderEvent::Placed(OrderPlacedData {
            order_id: order_id.into(),
            items,
            total_price,
            placed_at,
        })
    }

    pub fn confirmed(order_id: impl Into<String>, confirmed_at: DateTime<Utc>) -> Self {
        OrderEvent::Confirmed(OrderConfirmedData {
            order_id: order_id.into(),
            confirmed_at,
        })
    }
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::Confirmed(_) => "OrderConfirmed",
        }
    }

    fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            OrderEvent::Placed(data) => serde_json::to_value(data),
            OrderEvent::Confirmed(data) => serde_json::to_value(data),
        }
    }

    fn from_payload(event_type: &str, payload: serde_json::Value) -> Result<Self, DomainError> {
        match event_type {
            "OrderPlaced" => Ok(OrderEvent::Placed(serde_json::from_value(payload)?)),
            "OrderConfirmed" => Ok(OrderEvent::Confirmed(serde_json::from_value(payload)?)),
            other => Err(DomainError::UnknownEventKind {
                aggregate: "OrderAggregate",
                event_type: other.to_string(),
            }),
        }
    }
}

/// State of an order, rebuilt by replaying its stream.
#[derive(Debug, Clone)]
pub struct OrderAggregate {
    id: StreamId,
    version: Version,
    pub items: Vec<OrderItem>,
    pub total_price: f64,
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Aggregate for OrderAggregate {
    type Event = OrderEvent;

    fn stream_type() -> StreamType {
        StreamType::Order
    }

    fn new(id: StreamId) -> Self {
        Self {
            id,
            version: Version::initial(),
            items: Vec::new(),
            total_price: 0.0,
            status: OrderStatus::Pending,
            created_at: None,
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
            OrderEvent::Placed(data) => {
                self.items = data.items;
                self.total_price = data.total_price;
                self.status = OrderStatus::Placed;
                if self.created_at.is_none() {
                    self.created_at = Some(data.placed_at);
                }
            }
            OrderEvent::Confirmed(_) => {
                self.status = OrderStatus::Confirmed;
            }
        }
        self.version = self.version.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::StreamId;
    use event_store::{EventId, EventRecord};

    fn record(version: i64, event: &OrderEvent) -> EventRecord {
        EventRecord {
            id: EventId::new(),
            stream_id: StreamId::new("order-1"),
            stream_type: StreamType::Order,
            version: Version::new(version),
            event_type: event.event_type().to_string(),
            payload: event.to_payload().unwrap(),
            created_at: Utc::now(),
        }
    }

    fn placed_event() -> OrderEvent {
        OrderEvent::placed(
            "order-1",
            vec![OrderItem::new("prod-001", "Headphones", 10.0, 3)],
            30.0,
            Utc::now(),
        )
    }

    #[test]
    fn fresh_order_is_pending_at_version_zero() {
        let order = OrderAggregate::new(StreamId::new("order-1"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.version(), Version::initial());
        assert!(order.items.is_empty());
    }

    #[test]
    fn placed_sets_items_total_and_created_at() {
        let mut order = OrderAggregate::new(StreamId::new("order-1"));
        order.apply(placed_event());

        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.items.len(), 1);
        assert!((order.total_price - 30.0).abs() < 1e-9);
        assert!(order.created_at.is_some());
        assert_eq!(order.version(), Version::first());
    }

    #[test]
    fn confirmed_advances_status_and_version() {
        let mut order = OrderAggregate::new(StreamId::new("order-1"));
        order.apply(placed_event());
        order.apply(OrderEvent::confirmed("order-1", Utc::now()));

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.version(), Version::new(2));
    }

    #[test]
    fn created_at_is_first_write_wins() {
        let mut order = OrderAggregate::new(StreamId::new("order-1"));
        let first = placed_event();
        let first_placed_at = match &first {
            OrderEvent::Placed(data) => data.placed_at,
            _ => unreachable!(),
        };
        order.apply(first);
        order.apply(placed_event());

        assert_eq!(order.created_at, Some(first_placed_at));
    }

    #[test]
    fn rehydrate_equals_folding_applies() {
        let events = vec![
            placed_event(),
            OrderEvent::confirmed("order-1", Utc::now()),
        ];

        let mut folded = OrderAggregate::new(StreamId::new("order-1"));
        for event in &events {
            folded.apply(event.clone());
        }

        let records: Vec<EventRecord> = events
            .iter()
            .enumerate()
            .map(|(i, e)| record(i as i64 + 1, e))
            .collect();
        let mut rehydrated = OrderAggregate::new(StreamId::new("order-1"));
        rehydrated.rehydrate(&records).unwrap();

        assert_eq!(rehydrated.status, folded.status);
        assert_eq!(rehydrated.items, folded.items);
        assert_eq!(rehydrated.version(), folded.version());
        assert!((rehydrated.total_price - folded.total_price).abs() < 1e-9);
    }

    #[test]
    fn unknown_event_kind_fails_rehydration() {
        let mut bogus = record(1, &placed_event());
        bogus.event_type = "ItemAddedToCart".to_string();

        let mut order = OrderAggregate::new(StreamId::new("order-1"));
        let err = order.rehydrate(&[bogus]).unwrap_err();
        assert!(matches!(err, DomainError::UnknownEventKind { .. }));
    }

    #[test]
    fn payload_round_trip_preserves_wire_field_names() {
        let event = placed_event();
        let payload = event.to_payload().unwrap();

        assert_eq!(payload["order_id"], "order-1");
        assert_eq!(payload["total_price"], 30.0);
        assert_eq!(payload["items"][0]["product_id"], "prod-001");
        assert!(payload.get("placed_at").is_some());

        let decoded = OrderEvent::from_payload("OrderPlaced", payload).unwrap();
        assert!(matches!(decoded, OrderEvent::Placed(_)));
    }
}
