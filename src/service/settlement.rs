use chrono::{DateTime, Utc};
use crate::domain::aggregates::{Invoice, InvoiceError, Order, OrderId, Payment, PaymentDraft, Settlement};
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::UserId;
use crate::service::OrderService;
use crate::{Error, Result};

impl OrderService {
    /// Charges a pending order through the simulated gateway and completes it.
    /// A second attempt on the same order is rejected and records nothing.
    pub async fn process_payment(&self, owner: UserId, id: OrderId, now: DateTime<Utc>) -> Result<(Order, Payment)> {
        match self.store.settle(owner, id, PaymentDraft::simulated(now)).await? {
            Settlement::Settled { order, payment } => {
                tracing::info!(order_id = %id, payment_id = %payment.payment_id, amount = %payment.amount, "payment settled");
                self.events.publish(OrderEvent::Paid { order_id: id, payment_id: payment.payment_id.clone(), amount: payment.amount }).await;
                Ok((order, payment))
            }
            Settlement::NotFound => Err(Error::OrderNotFound),
            Settlement::AlreadyProcessed(status) => {
                tracing::warn!(order_id = %id, %status, "payment refused: order already processed");
                Err(Error::AlreadyProcessed)
            }
        }
    }

    pub async fn invoice(&self, owner: UserId, id: OrderId) -> Result<Invoice> {
        let order = self.store.find_owned(owner, id).await?.ok_or(Error::OrderNotFound)?;
        if !order.is_completed() { return Err(InvoiceError::NotCompleted.into()); }

        let payment = self.store.payment_for(id).await?;
        let lines = self.store.order_lines(id).await?;
        let purchaser = self.store.purchaser(owner).await?;
        Ok(Invoice::assemble(&order, &lines, payment.as_ref(), purchaser)?)
    }
}
