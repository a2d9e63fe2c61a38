use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use crate::domain::aggregates::{
    NewOrder, Order, OrderDetails, OrderId, OrderItem, OrderLine, OrderStatus, Payment, PaymentDraft, Purchaser,
    Settlement, ShippingStatus,
};
use crate::domain::value_objects::{ProductId, UserId};
use crate::store::OrderStore;
use crate::{Error, Result};

#[derive(Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    items: HashMap<OrderId, Vec<OrderItem>>,
    payments: Vec<Payment>,
    products: HashMap<ProductId, String>,
    users: HashMap<UserId, Purchaser>,
}

impl Inner {
    fn lines(&self, id: OrderId) -> Vec<OrderLine> {
        self.items.get(&id).map(|items| items.iter().map(|i| OrderLine {
            product_id: i.product_id,
            product_name: self.products.get(&i.product_id).cloned(),
            quantity: i.quantity,
            unit_price: i.unit_price,
            subtotal: i.subtotal,
        }).collect()).unwrap_or_default()
    }
}

/// In-process store for unit tests. Each call holds one lock for its whole
/// duration, which gives the same all-or-nothing behaviour as a database transaction.
#[derive(Default)]
pub struct MemoryOrderStore {
    inner: Mutex<Inner>,
}

impl MemoryOrderStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_product(mut self, id: ProductId, name: impl Into<String>) -> Self {
        self.inner.get_mut().products.insert(id, name.into());
        self
    }

    pub fn with_user(mut self, id: UserId, username: impl Into<String>, email: impl Into<String>) -> Self {
        let purchaser = Purchaser { username: Some(username.into()), email: Some(email.into()) };
        self.inner.get_mut().users.insert(id, purchaser);
        self
    }

    pub async fn order_count(&self) -> usize { self.inner.lock().await.orders.len() }

    pub async fn payments_for(&self, id: OrderId) -> Vec<Payment> {
        self.inner.lock().await.payments.iter().filter(|p| p.order_id == id).cloned().collect()
    }

    pub async fn items_for(&self, id: OrderId) -> Vec<OrderItem> {
        self.inner.lock().await.items.get(&id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert_order(&self, order: &NewOrder) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(missing) = order.items.iter().find(|i| !inner.products.contains_key(&i.product_id)) {
            return Err(Error::ProductNotFound(missing.product_id));
        }
        inner.orders.insert(order.order.id, order.order.clone());
        inner.items.insert(order.order.id, order.items.clone());
        Ok(())
    }

    async fn orders_for_owner(&self, owner: UserId) -> Result<Vec<OrderDetails>> {
        let inner = self.inner.lock().await;
        let mut orders: Vec<&Order> = inner.orders.values().filter(|o| o.owner == owner).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders.into_iter().map(|o| OrderDetails { order: o.clone(), items: inner.lines(o.id) }).collect())
    }

    async fn find_owned(&self, owner: UserId, id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.lock().await.orders.get(&id).filter(|o| o.owner == owner).cloned())
    }

    async fn order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>> {
        Ok(self.inner.lock().await.lines(id))
    }

    async fn record_progress(&self, from: &Order, to: &Order) -> Result<(Order, bool)> {
        let mut inner = self.inner.lock().await;
        let stored = inner.orders.get_mut(&from.id).ok_or(Error::OrderNotFound)?;
        if stored.shipping_status != from.shipping_status {
            return Ok((stored.clone(), false));
        }
        stored.shipping_status = to.shipping_status;
        if stored.estimated_delivery.is_none() {
            stored.estimated_delivery = to.estimated_delivery;
        }
        if to.shipping_status == ShippingStatus::Delivered {
            stored.status = OrderStatus::Completed;
        }
        Ok((stored.clone(), true))
    }

    async fn overwrite_status(&self, id: OrderId, status: &OrderStatus) -> Result<Option<Order>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.orders.get_mut(&id).map(|o| {
            o.status = status.clone();
            o.clone()
        }))
    }

    async fn settle(&self, owner: UserId, id: OrderId, draft: PaymentDraft) -> Result<Settlement> {
        let mut inner = self.inner.lock().await;
        let already_paid = inner.payments.iter().any(|p| p.order_id == id);
        let Some(order) = inner.orders.get_mut(&id).filter(|o| o.owner == owner) else {
            return Ok(Settlement::NotFound);
        };
        if !order.is_payable() || already_paid {
            return Ok(Settlement::AlreadyProcessed(order.status.clone()));
        }
        order.status = OrderStatus::Completed;
        let order = order.clone();
        let payment = draft.settle(&order);
        inner.payments.push(payment.clone());
        Ok(Settlement::Settled { order, payment })
    }

    async fn payment_for(&self, id: OrderId) -> Result<Option<Payment>> {
        Ok(self.inner.lock().await.payments.iter().find(|p| p.order_id == id).cloned())
    }

    async fn purchaser(&self, user: UserId) -> Result<Purchaser> {
        Ok(self.inner.lock().await.users.get(&user).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::CartSnapshot;
    use chrono::{Duration, Utc};

    fn new_order(owner: UserId, product_id: ProductId) -> NewOrder {
        let cart: CartSnapshot = serde_json::from_value(serde_json::json!({
            "cart_items": [{"product_id": product_id, "quantity": 1, "product": {"price": 5.0}}]
        })).unwrap();
        Order::place(owner, &cart.price().unwrap(), Utc::now(), Duration::days(1))
    }

    #[tokio::test]
    async fn test_insert_rejects_unknown_product() {
        let store = MemoryOrderStore::new().with_product(1, "Widget");
        let err = store.insert_order(&new_order(1, 2)).await.unwrap_err();
        assert!(matches!(err, Error::ProductNotFound(2)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_settle_is_single_shot() {
        let store = MemoryOrderStore::new().with_product(1, "Widget");
        let placed = new_order(3, 1);
        store.insert_order(&placed).await.unwrap();

        assert!(matches!(store.settle(4, placed.order.id, PaymentDraft::simulated(Utc::now())).await.unwrap(), Settlement::NotFound));
        assert!(matches!(store.settle(3, placed.order.id, PaymentDraft::simulated(Utc::now())).await.unwrap(), Settlement::Settled { .. }));
        assert!(matches!(
            store.settle(3, placed.order.id, PaymentDraft::simulated(Utc::now())).await.unwrap(),
            Settlement::AlreadyProcessed(OrderStatus::Completed)
        ));
        assert_eq!(store.payments_for(placed.order.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_progress_does_not_regress_a_settled_order() {
        let store = MemoryOrderStore::new().with_product(1, "Widget");
        let placed = new_order(3, 1);
        store.insert_order(&placed).await.unwrap();
        let stale = placed.order.clone();
        store.settle(3, stale.id, PaymentDraft::simulated(Utc::now())).await.unwrap();

        let mut shipped = stale.clone();
        shipped.shipping_status = ShippingStatus::Shipped;
        let (stored, applied) = store.record_progress(&stale, &shipped).await.unwrap();
        assert!(applied);
        assert_eq!(stored.shipping_status, ShippingStatus::Shipped);
        assert_eq!(stored.status, OrderStatus::Completed);

        let (again, applied) = store.record_progress(&stale, &shipped).await.unwrap();
        assert!(!applied);
        assert_eq!(again, stored);
    }
}
