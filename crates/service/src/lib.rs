//! Command pipeline and broker-driven handlers.
//!
//! This crate owns the write side of the system: commands load aggregates
//! from the event store, validate against rebuilt state, append new events
//! with optimistic concurrency, and publish facts to the broker. The
//! broker-driven handlers keep the read model current and advance the
//! order state machine through its single confirm step.

pub mod cart_service;
pub mod commands;
pub mod consumers;
pub mod error;
pub mod order_service;

pub use cart_service::CartService;
pub use commands::PlaceOrder;
pub use consumers::{
    GROUP_COMMANDS, GROUP_CONFIRMED_PROJECTION, GROUP_PLACED, TOPIC_ORDER_COMMANDS,
    TOPIC_ORDER_CONFIRMED, TOPIC_ORDER_PLACED, spawn_consumers,
};
pub use error::CommandError;
pub use order_service::OrderService;
