//! Order command and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use domain::OrderItem;
use event_store::EventStore;
use messaging::EventPublisher;
use projections::{OrderProjection, OrderProjectionStore, ProductCatalogue};
use serde::{Deserialize, Serialize};
use service::PlaceOrder;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItem>,
}

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub limit: Option<usize>,
}

/// POST /api/orders — place an order under a freshly minted id.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, B, R, C>(
    State(state): State<Arc<AppState<S, B, R, C>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError>
where
    S: EventStore + 'static,
    B: EventPublisher + 'static,
    R: OrderProjectionStore + 'static,
    C: ProductCatalogue + 'static,
{
    let cmd = PlaceOrder::new(Uuid::new_v4().to_string(), req.items);
    state.orders.place_order(&cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            order_id: cmd.order_id,
            status: "placed".to_string(),
        }),
    ))
}

/// GET /api/orders — list recent orders from the projection.
#[tracing::instrument(skip(state))]
pub async fn list<S, B, R, C>(
    State(state): State<Arc<AppState<S, B, R, C>>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderProjection>>, ApiError>
where
    S: EventStore + 'static,
    B: EventPublisher + 'static,
    R: OrderProjectionStore + 'static,
    C: ProductCatalogue + 'static,
{
    let orders = state.orders.recent_orders(query.limit.unwrap_or(0)).await?;
    Ok(Json(orders))
}
