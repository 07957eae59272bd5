//! Cart endpoints, served straight from the cart event streams.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::CartItem;
use event_store::EventStore;
use messaging::EventPublisher;
use projections::{OrderProjectionStore, ProductCatalogue};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: String,
    pub quantity: i64,
    pub price: f64,
}

/// GET /api/cart/{id} — current cart items.
#[tracing::instrument(skip(state))]
pub async fn get_cart<S, B, R, C>(
    State(state): State<Arc<AppState<S, B, R, C>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CartItem>>, ApiError>
where
    S: EventStore + 'static,
    B: EventPublisher + 'static,
    R: OrderProjectionStore + 'static,
    C: ProductCatalogue + 'static,
{
    let cart = state.carts.get_cart(&id).await?;

    let mut items: Vec<CartItem> = cart.items.into_values().collect();
    items.sort_by(|a, b| a.product_id.cmp(&b.product_id));
    Ok(Json(items))
}

/// POST /api/cart/{id}/items — add an item to the cart.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S, B, R, C>(
    State(state): State<Arc<AppState<S, B, R, C>>>,
    Path(id): Path<String>,
    Json(req): Json<AddCartItemRequest>,
) -> Result<StatusCode, ApiError>
where
    S: EventStore + 'static,
    B: EventPublisher + 'static,
    R: OrderProjectionStore + 'static,
    C: ProductCatalogue + 'static,
{
    state
        .carts
        .add_item(&id, &req.product_id, req.quantity, req.price)
        .await?;
    Ok(StatusCode::OK)
}
