//! Inventory aggregate: per-product stock tracking with soft reservations.

use common::{StreamId, StreamType};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::event::DomainEvent;

/// Body of the `ProductStockUpdated` event. Used for the catalogue
/// bootstrap and manual adjustments; replaces the hard stock outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductStockUpdatedData {
    pub product_id: String,
    pub new_stock: i64,
}

/// Body of the `InventoryReserved` event: stock soft-locked for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryReservedData {
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
}

/// Body of the `ReservationReleased` event: a cancelled or failed order
/// unlocks its reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationReleasedData {
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
}

/// Body of the `ReservationConfirmed` event: a finalized order turns the
/// soft lock into a hard deduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfirmedData {
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
}

/// Events that can occur on an inventory stream.
#[derive(Debug, Clone)]
pub enum InventoryEvent {
    StockUpdated(ProductStockUpdatedData),
    Reserved(InventoryReservedData),
    ReservationReleased(ReservationReleasedData),
    ReservationConfirmed(ReservationConfirmedData),
}

impl InventoryEvent {
    pub fn stock_updated(product_id: impl Into<String>, new_stock: i64) -> Self {
        InventoryEvent::StockUpdated(ProductStockUpdatedData {
            product_id: product_id.into(),
            new_stock,
        })
    }

    pub fn reserved(
        order_id: impl Into<String>,
        product_id: impl Into<String>,
        quantity: i64,
    ) -> Self {
        InventoryEvent::Reserved(InventoryReservedData {
            order_id: order_id.into(),
            product_id: product_id.into(),
            quantity,
        })
    }

    pub fn reservation_released(
        order_id: impl Into<String>,
        product_id: impl Into<String>,
        quantity: i64,
    ) -> Self {
        InventoryEvent::ReservationReleased(ReservationReleasedData {
            order_id: order_id.into(),
            product_id: product_id.into(),
            quantity,
        })
    }

    pub fn reservation_confirmed(
        order_id: impl Into<String>,
        product_id: impl Into<String>,
        quantity: i64,
    ) -> Self {
        InventoryEvent::ReservationConfirmed(ReservationConfirmedData {
            order_id: order_id.into(),
            product_id: product_id.into(),
            quantity,
        })
    }
}

impl DomainEvent for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::StockUpdated(_) => "ProductStockUpdated",
            InventoryEvent::Reserved(_) => "InventoryReserved",
            InventoryEvent::ReservationReleased(_) => "ReservationReleased",
            InventoryEvent::ReservationConfirmed(_) => "ReservationConfirmed",
        }
    }

    fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            InventoryEvent::StockUpdated(data) => serde_json::to_value(data),
            InventoryEvent::Reserved(data) => serde_json::to_value(data),
            InventoryEvent::ReservationReleased(data) => serde_json::to_value(data),
            InventoryEvent::ReservationConfirmed(data) => serde_json::to_value(data),
        }
    }

    fn from_payload(event_type: &str, payload: serde_json::Value) -> Result<Self, DomainError> {
        match event_type {
            "ProductStockUpdated" => Ok(InventoryEvent::StockUpdated(serde_json::from_value(
                payload,
            )?)),
            "InventoryReserved" => Ok(InventoryEvent::Reserved(serde_json::from_value(payload)?)),
            "ReservationReleased" => Ok(InventoryEvent::ReservationReleased(
                serde_json::from_value(payload)?,
            )),
            "ReservationConfirmed" => Ok(InventoryEvent::ReservationConfirmed(
                serde_json::from_value(payload)?,
            )),
            other => Err(DomainError::UnknownEventKind {
                aggregate: "InventoryAggregate",
                event_type: other.to_string(),
            }),
        }
    }
}

/// Stock position of one product, rebuilt by replaying its stream.
///
/// The command layer's preconditions keep
/// `hard_stock >= reserved_stock >= 0` after every applied event.
#[derive(Debug, Clone)]
pub struct InventoryAggregate {
    id: StreamId,
    version: Version,
    pub hard_stock: i64,
    pub reserved_stock: i64,
}

impl InventoryAggregate {
    /// Stock available for new reservations.
    pub fn available(&self) -> i64 {
        self.hard_stock - self.reserved_stock
    }
}

impl Aggregate for InventoryAggregate {
    type Event = InventoryEvent;

    fn stream_type() -> StreamType {
        StreamType::Inventory
    }

    fn new(id: StreamId) -> Self {
        Self {
            id,
            version: Version::initial(),
            hard_stock: 0,
            reserved_stock: 0,
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
            InventoryEvent::StockUpdated(data) => {
                self.hard_stock = data.new_stock;
            }
            InventoryEvent::Reserved(data) => {
                self.reserved_stock += data.quantity;
            }
            InventoryEvent::ReservationReleased(data) => {
                self.reserved_stock -= data.quantity;
            }
            InventoryEvent::ReservationConfirmed(data) => {
                self.reserved_stock -= data.quantity;
                self.hard_stock -= data.quantity;
            }
        }
        self.version = self.version.next();

        debug_assert!(self.reserved_stock >= 0, "reserved stock went negative");
        debug_assert!(
            self.hard_stock >= self.reserved_stock,
            "reserved stock exceeds hard stock"
        );
    }
}
