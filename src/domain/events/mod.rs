//! Domain events
//!
//! Lifecycle changes are announced on NATS as `orders.<kind>` when a broker is
//! configured. Publishing is best effort: a lost event never fails the request
//! that caused it.

use serde::Serialize;
use crate::domain::aggregates::{OrderId, OrderStatus};
use crate::domain::value_objects::{Money, PaymentReference, UserId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: OrderId, owner: UserId, total: Money, items: usize },
    Shipped { order_id: OrderId },
    Delivered { order_id: OrderId },
    Paid { order_id: OrderId, payment_id: PaymentReference, amount: Money },
    StatusOverridden { order_id: OrderId, status: OrderStatus, by: UserId },
}

impl OrderEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Placed { .. } => "placed",
            Self::Shipped { .. } => "shipped",
            Self::Delivered { .. } => "delivered",
            Self::Paid { .. } => "paid",
            Self::StatusOverridden { .. } => "status_overridden",
        }
    }

    pub fn subject(&self) -> String { format!("orders.{}", self.kind()) }
}

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }
    pub fn disabled() -> Self { Self::default() }

    pub async fn publish(&self, event: OrderEvent) {
        let Some(client) = &self.nats else { return };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, kind = event.kind(), "failed to encode order event");
                return;
            }
        };
        if let Err(e) = client.publish(event.subject(), payload.into()).await {
            tracing::warn!(error = %e, subject = %event.subject(), "failed to publish order event");
        }
    }
}
