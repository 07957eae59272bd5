//! Shared identifier types for the event-sourced storefront.

pub mod types;

pub use types::{StreamId, StreamType, UnknownStreamType};
