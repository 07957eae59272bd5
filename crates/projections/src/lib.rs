//! Read models for the CQRS query side.
//!
//! This crate provides the denormalised views consumed by the query API:
//! - [`OrderProjectionStore`] — the orders projection, kept eventually
//!   consistent with the order event streams by the broker-driven handlers
//! - [`ProductCatalogue`] — the seeded product reference table
//!
//! Projections are deterministic functions of the event log and may be
//! rebuilt by truncating the tables and replaying all streams.

pub mod error;
pub mod memory;
pub mod orders;
pub mod product;

pub use error::{ReadModelError, Result};
pub use memory::{InMemoryOrderProjectionStore, InMemoryProductCatalogue};
pub use orders::{OrderProjection, OrderProjectionStore, PgOrderProjectionStore};
pub use product::{PgProductCatalogue, Product, ProductCatalogue, default_catalogue};
