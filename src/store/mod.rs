//! Persistence for orders, order items and payments.
//!
//! Every write method is one unit of work: it opens, uses and commits its own
//! transaction, so a failed call leaves nothing behind.

#[cfg(test)]
mod memory;
mod postgres;

#[cfg(test)]
pub use memory::MemoryOrderStore;
pub use postgres::PgOrderStore;

use async_trait::async_trait;
use crate::domain::aggregates::{NewOrder, Order, OrderDetails, OrderId, OrderLine, OrderStatus, Payment, PaymentDraft, Purchaser, Settlement};
use crate::domain::value_objects::UserId;
use crate::Result;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes the order and all of its items. Fails with `ProductNotFound`, writing
    /// nothing, when a line references a product the catalog does not know.
    async fn insert_order(&self, order: &NewOrder) -> Result<()>;

    /// Orders of `owner`, newest first, each with its lines.
    async fn orders_for_owner(&self, owner: UserId) -> Result<Vec<OrderDetails>>;

    async fn find_owned(&self, owner: UserId, id: OrderId) -> Result<Option<Order>>;

    async fn order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>>;

    /// Stores shipping progress computed from `from`. The write only applies while
    /// the stored shipping status still equals `from.shipping_status`. Returns the
    /// order as stored after the call and whether this call's write applied.
    async fn record_progress(&self, from: &Order, to: &Order) -> Result<(Order, bool)>;

    /// Overwrites the status label. `None` when the order does not exist.
    async fn overwrite_status(&self, id: OrderId, status: &OrderStatus) -> Result<Option<Order>>;

    /// Flips a pending order owned by `owner` to completed and records the payment,
    /// atomically. Only one caller can ever observe `Settled` for a given order; an
    /// order that already has a payment is `AlreadyProcessed` whatever its status.
    async fn settle(&self, owner: UserId, id: OrderId, draft: PaymentDraft) -> Result<Settlement>;

    async fn payment_for(&self, id: OrderId) -> Result<Option<Payment>>;

    /// Purchaser details from the accounts service; empty when the account is gone.
    async fn purchaser(&self, user: UserId) -> Result<Purchaser>;
}
