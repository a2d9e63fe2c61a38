use chrono::{DateTime, Utc};
use crate::domain::aggregates::{CartSnapshot, Order, OrderDetails, OrderId, OrderStatus};
use crate::domain::events::OrderEvent;
use crate::domain::shipping::{advance, ShippingStep};
use crate::domain::value_objects::UserId;
use crate::identity::Identity;
use crate::service::OrderService;
use crate::{Error, Result};

impl OrderService {
    /// Prices the cart snapshot and stores the order with its items in one unit of work.
    pub async fn create_order(&self, owner: UserId, cart: &CartSnapshot, now: DateTime<Utc>) -> Result<Order> {
        let priced = cart.price()?;
        let placed = Order::place(owner, &priced, now, self.policy.delivery_window);
        self.store.insert_order(&placed).await?;

        let order = placed.order;
        tracing::info!(order_id = %order.id, owner, total = %order.total_price, items = placed.items.len(), "order placed");
        self.events.publish(OrderEvent::Placed { order_id: order.id, owner, total: order.total_price, items: placed.items.len() }).await;
        Ok(order)
    }

    /// Orders of `owner`, newest first. Orders stored without an estimate report the default one.
    pub async fn history(&self, owner: UserId) -> Result<Vec<OrderDetails>> {
        let mut orders = self.store.orders_for_owner(owner).await?;
        for details in &mut orders {
            details.order.estimated_delivery = Some(details.order.estimated_delivery_or_default(self.policy.delivery_window));
        }
        Ok(orders)
    }

    /// Reads an order and applies whatever shipping transitions are due at `now`.
    pub async fn track(&self, owner: UserId, id: OrderId, now: DateTime<Utc>) -> Result<Order> {
        let order = self.store.find_owned(owner, id).await?.ok_or(Error::OrderNotFound)?;
        let next = advance(&order, now, &self.policy);
        if !next.changed() { return Ok(order); }

        let (stored, applied) = self.store.record_progress(&order, &next.order).await?;
        if !applied {
            tracing::debug!(order_id = %id, "shipping progress already recorded by a concurrent read");
            return Ok(stored);
        }
        for step in &next.steps {
            match step {
                ShippingStep::Scheduled => tracing::info!(order_id = %id, "estimated delivery backfilled"),
                ShippingStep::Shipped => {
                    tracing::info!(order_id = %id, "order shipped");
                    self.events.publish(OrderEvent::Shipped { order_id: id }).await;
                }
                ShippingStep::Delivered => {
                    tracing::info!(order_id = %id, "order delivered");
                    self.events.publish(OrderEvent::Delivered { order_id: id }).await;
                }
            }
        }
        Ok(stored)
    }

    /// Overwrites the status label with no transition check. Any authenticated caller
    /// may do this unless the service was built with the admin-only guard.
    pub async fn update_status(&self, caller: &Identity, id: OrderId, status: &str) -> Result<Order> {
        let status = status.trim();
        if status.is_empty() { return Err(Error::Validation("Status is required".into())); }
        if self.status_override_admin_only && !caller.is_admin() {
            tracing::warn!(order_id = %id, caller = caller.user_id, "status override refused for non-admin caller");
            return Err(Error::Forbidden);
        }

        let status = OrderStatus::from(status);
        let order = self.store.overwrite_status(id, &status).await?.ok_or(Error::OrderNotFound)?;
        if order.owner != caller.user_id {
            tracing::warn!(order_id = %id, owner = order.owner, caller = caller.user_id, %status, "order status overridden by non-owner");
        } else {
            tracing::info!(order_id = %id, %status, "order status overridden");
        }
        self.events.publish(OrderEvent::StatusOverridden { order_id: id, status, by: caller.user_id }).await;
        Ok(order)
    }
}
