//! Product catalogue endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use event_store::EventStore;
use messaging::EventPublisher;
use projections::{OrderProjectionStore, Product, ProductCatalogue};

use crate::AppState;
use crate::error::ApiError;

/// GET /api/products — list the catalogue.
#[tracing::instrument(skip(state))]
pub async fn list<S, B, R, C>(
    State(state): State<Arc<AppState<S, B, R, C>>>,
) -> Result<Json<Vec<Product>>, ApiError>
where
    S: EventStore + 'static,
    B: EventPublisher + 'static,
    R: OrderProjectionStore + 'static,
    C: ProductCatalogue + 'static,
{
    let products = state.orders.products().await?;
    Ok(Json(products))
}
