//! Shipping progression.
//!
//! There is no scheduler. An order moves `Processing -> Shipped -> Delivered` when
//! someone looks at it: every tracking read runs [`advance`] with the current time
//! and persists whatever changed. Status is therefore only as fresh as the last read.

use chrono::{DateTime, Duration, Utc};
use crate::domain::aggregates::{Order, OrderStatus, ShippingStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShippingPolicy {
    /// Time after placement at which a processing order counts as shipped.
    pub ship_after: Duration,
    /// Default gap between placement and estimated delivery.
    pub delivery_window: Duration,
}

impl Default for ShippingPolicy {
    fn default() -> Self { Self { ship_after: Duration::hours(2), delivery_window: Duration::days(1) } }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShippingStep {
    /// A missing estimated delivery was filled in.
    Scheduled,
    Shipped,
    /// Delivery also completes the order.
    Delivered,
}

#[derive(Clone, Debug)]
pub struct Advance {
    pub order: Order,
    pub steps: Vec<ShippingStep>,
}

impl Advance {
    pub fn changed(&self) -> bool { !self.steps.is_empty() }
}

/// Applies every transition that is due at `now`. Both shipping steps may fire in
/// one call. Running it again at the same or a later instant never goes backwards.
pub fn advance(order: &Order, now: DateTime<Utc>, policy: &ShippingPolicy) -> Advance {
    let mut next = order.clone();
    let mut steps = Vec::new();

    let estimated_delivery = match next.estimated_delivery {
        Some(at) => at,
        None => {
            let at = next.created_at + policy.delivery_window;
            next.estimated_delivery = Some(at);
            steps.push(ShippingStep::Scheduled);
            at
        }
    };

    if next.shipping_status == ShippingStatus::Processing && now > next.created_at + policy.ship_after {
        next.shipping_status = ShippingStatus::Shipped;
        steps.push(ShippingStep::Shipped);
    }

    if next.shipping_status == ShippingStatus::Shipped && now > estimated_delivery {
        next.shipping_status = ShippingStatus::Delivered;
        next.status = OrderStatus::Completed;
        steps.push(ShippingStep::Delivered);
    }

    Advance { order: next, steps }
}
