use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use crate::api::error::ApiError;
use crate::api::AppState;
use crate::domain::aggregates::{Invoice, OrderId, OrderStatus};
use crate::domain::value_objects::PaymentReference;
use crate::identity::Identity;
use crate::Error;

#[derive(Debug, Deserialize)]
pub struct ProcessPaymentRequest { pub order_id: Option<OrderId> }

#[derive(Debug, Serialize)]
pub struct PaymentProcessed {
    pub message: &'static str,
    pub payment_id: PaymentReference,
    pub order_id: OrderId,
    pub status: OrderStatus,
}

pub async fn process_payment(State(s): State<AppState>, identity: Identity, payload: Result<Json<ProcessPaymentRequest>, JsonRejection>) -> Result<Json<PaymentProcessed>, ApiError> {
    let Json(req) = payload?;
    let order_id = req.order_id.ok_or_else(|| Error::Validation("Order ID is required".into()))?;
    let (order, payment) = s.service.process_payment(identity.user_id, order_id, Utc::now()).await?;
    Ok(Json(PaymentProcessed { message: "Payment processed successfully", payment_id: payment.payment_id, order_id: order.id, status: order.status }))
}

pub async fn generate_invoice(State(s): State<AppState>, identity: Identity, id: Result<Path<OrderId>, PathRejection>) -> Result<Json<Invoice>, ApiError> {
    let Path(id) = id?;
    Ok(Json(s.service.invoice(identity.user_id, id).await?))
}
