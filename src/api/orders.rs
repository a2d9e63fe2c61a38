use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::api::error::ApiError;
use crate::api::AppState;
use crate::domain::aggregates::{CartSnapshot, Order, OrderDetails, OrderId, OrderStatus, ShippingStatus};
use crate::domain::value_objects::Money;
use crate::identity::Identity;
use crate::Error;

#[derive(Debug, Serialize)]
pub struct OrderPlaced { pub message: &'static str, pub order_id: OrderId }

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: OrderId,
    pub total_price: Money,
    pub status: OrderStatus,
    pub shipping_status: ShippingStatus,
    pub created_at: DateTime<Utc>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub items: Vec<HistoryItem>,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem { pub product: Option<String>, pub quantity: u32, pub subtotal: Money }

#[derive(Debug, Serialize)]
pub struct Tracking {
    pub id: OrderId,
    pub status: OrderStatus,
    pub shipping_status: ShippingStatus,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest { pub status: Option<String> }

#[derive(Debug, Serialize)]
pub struct StatusUpdated { pub message: &'static str, pub new_status: OrderStatus }

impl From<OrderDetails> for HistoryEntry {
    fn from(d: OrderDetails) -> Self {
        Self {
            id: d.order.id,
            total_price: d.order.total_price,
            status: d.order.status,
            shipping_status: d.order.shipping_status,
            created_at: d.order.created_at,
            estimated_delivery: d.order.estimated_delivery,
            items: d.items.into_iter().map(|i| HistoryItem { product: i.product_name, quantity: i.quantity.value(), subtotal: i.subtotal }).collect(),
        }
    }
}

impl From<Order> for Tracking {
    fn from(o: Order) -> Self {
        Self { id: o.id, status: o.status, shipping_status: o.shipping_status, estimated_delivery: o.estimated_delivery }
    }
}

pub async fn create_order(State(s): State<AppState>, identity: Identity, payload: Result<Json<CartSnapshot>, JsonRejection>) -> Result<(StatusCode, Json<OrderPlaced>), ApiError> {
    let Json(cart) = payload?;
    let order = s.service.create_order(identity.user_id, &cart, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(OrderPlaced { message: "Order placed successfully", order_id: order.id })))
}

pub async fn order_history(State(s): State<AppState>, identity: Identity) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let orders = s.service.history(identity.user_id).await?;
    Ok(Json(orders.into_iter().map(HistoryEntry::from).collect()))
}

pub async fn track_order(State(s): State<AppState>, identity: Identity, id: Result<Path<OrderId>, PathRejection>) -> Result<Json<Tracking>, ApiError> {
    let Path(id) = id?;
    let order = s.service.track(identity.user_id, id, Utc::now()).await?;
    Ok(Json(order.into()))
}

pub async fn update_order_status(
    State(s): State<AppState>,
    identity: Identity,
    id: Result<Path<OrderId>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<StatusUpdated>, ApiError> {
    let Json(req) = payload?;
    let status = req.status.ok_or_else(|| Error::Validation("Status is required".into()))?;
    let Path(id) = id?;
    let order = s.service.update_status(&identity, id, &status).await?;
    Ok(Json(StatusUpdated { message: "Order status updated", new_status: order.status }))
}
