use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use std::collections::HashMap;
use uuid::Uuid;
use crate::domain::aggregates::{
    NewOrder, Order, OrderDetails, OrderId, OrderLine, OrderStatus, Payment, PaymentDraft, PaymentMethod, PaymentStatus,
    Purchaser, Settlement, ShippingStatus,
};
use crate::domain::value_objects::{Money, PaymentReference, ProductId, Quantity, UserId};
use crate::store::OrderStore;
use crate::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: i64,
    total_price_cents: i64,
    status: String,
    shipping_status: String,
    created_at: DateTime<Utc>,
    estimated_delivery: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = Error;
    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(Order {
            id: row.id,
            owner: row.user_id,
            total_price: Money::from_minor(row.total_price_cents),
            status: OrderStatus::from(row.status),
            shipping_status: row.shipping_status.parse::<ShippingStatus>().map_err(|e| Error::Storage(e.to_string()))?,
            created_at: row.created_at,
            estimated_delivery: row.estimated_delivery,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    order_id: Uuid,
    product_id: i64,
    product_name: Option<String>,
    quantity: i32,
    unit_price_cents: i64,
    subtotal_cents: i64,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = Error;
    fn try_from(row: OrderLineRow) -> Result<Self> {
        Ok(OrderLine {
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: Quantity::try_from(i64::from(row.quantity)).map_err(|e| Error::Storage(e.to_string()))?,
            unit_price: Money::from_minor(row.unit_price_cents),
            subtotal: Money::from_minor(row.subtotal_cents),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    order_id: Uuid,
    payment_id: String,
    payment_method: String,
    amount_cents: i64,
    status: String,
    payment_date: DateTime<Utc>,
    transaction_details: Option<Json<serde_json::Value>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = Error;
    fn try_from(row: PaymentRow) -> Result<Self> {
        Ok(Payment {
            order_id: row.order_id,
            payment_id: PaymentReference::from_stored(row.payment_id),
            method: row.payment_method.parse::<PaymentMethod>().map_err(|e| Error::Storage(e.to_string()))?,
            amount: Money::from_minor(row.amount_cents),
            status: row.status.parse::<PaymentStatus>().map_err(|e| Error::Storage(e.to_string()))?,
            payment_date: row.payment_date,
            transaction_details: row.transaction_details.map(|j| j.0).unwrap_or(serde_json::Value::Null),
        })
    }
}

const LINES_QUERY: &str = "SELECT oi.order_id, oi.product_id, p.name AS product_name, oi.quantity, oi.unit_price_cents, oi.subtotal_cents \
     FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id \
     WHERE oi.order_id = ANY($1) ORDER BY oi.id";

pub struct PgOrderStore {
    db: PgPool,
}

impl PgOrderStore {
    pub fn new(db: PgPool) -> Self { Self { db } }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("SELECT id, user_id, total_price_cents, status, shipping_status, created_at, estimated_delivery FROM orders WHERE id = $1")
            .bind(id).fetch_optional(&self.db).await?.map(Order::try_from).transpose()
    }
}

fn db_quantity(q: Quantity) -> Result<i32> {
    i32::try_from(q.value()).map_err(|_| Error::Validation(format!("quantity out of range: {}", q.value())))
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert_order(&self, new: &NewOrder) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let mut product_ids: Vec<ProductId> = new.items.iter().map(|i| i.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let known: Vec<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ANY($1)")
            .bind(&product_ids).fetch_all(&mut *tx).await?;
        if let Some(missing) = product_ids.iter().find(|id| !known.contains(id)) {
            return Err(Error::ProductNotFound(*missing));
        }

        let o = &new.order;
        sqlx::query("INSERT INTO orders (id, user_id, total_price_cents, status, shipping_status, created_at, estimated_delivery) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(o.id).bind(o.owner).bind(o.total_price.minor()).bind(o.status.as_str()).bind(o.shipping_status.as_str())
            .bind(o.created_at).bind(o.estimated_delivery)
            .execute(&mut *tx).await?;

        for item in &new.items {
            sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents, subtotal_cents) VALUES ($1, $2, $3, $4, $5)")
                .bind(item.order_id).bind(item.product_id).bind(db_quantity(item.quantity)?)
                .bind(item.unit_price.minor()).bind(item.subtotal.minor())
                .execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn orders_for_owner(&self, owner: UserId) -> Result<Vec<OrderDetails>> {
        let orders = sqlx::query_as::<_, OrderRow>("SELECT id, user_id, total_price_cents, status, shipping_status, created_at, estimated_delivery FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(owner).fetch_all(&self.db).await?;
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let rows = sqlx::query_as::<_, OrderLineRow>(LINES_QUERY).bind(&ids).fetch_all(&self.db).await?;

        let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            lines.entry(order_id).or_default().push(OrderLine::try_from(row)?);
        }
        orders.into_iter().map(|row| {
            let items = lines.remove(&row.id).unwrap_or_default();
            Ok(OrderDetails { order: Order::try_from(row)?, items })
        }).collect()
    }

    async fn find_owned(&self, owner: UserId, id: OrderId) -> Result<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("SELECT id, user_id, total_price_cents, status, shipping_status, created_at, estimated_delivery FROM orders WHERE id = $1 AND user_id = $2")
            .bind(id).bind(owner).fetch_optional(&self.db).await?.map(Order::try_from).transpose()
    }

    async fn order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>> {
        sqlx::query_as::<_, OrderLineRow>(LINES_QUERY).bind(vec![id]).fetch_all(&self.db).await?
            .into_iter().map(OrderLine::try_from).collect()
    }

    async fn record_progress(&self, from: &Order, to: &Order) -> Result<(Order, bool)> {
        let updated = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET shipping_status = $3, \
                 estimated_delivery = COALESCE(estimated_delivery, $4), \
                 status = CASE WHEN $3 = 'Delivered' THEN 'Completed' ELSE status END \
             WHERE id = $1 AND shipping_status = $2 \
             RETURNING id, user_id, total_price_cents, status, shipping_status, created_at, estimated_delivery")
            .bind(from.id).bind(from.shipping_status.as_str()).bind(to.shipping_status.as_str()).bind(to.estimated_delivery)
            .fetch_optional(&self.db).await?;
        match updated {
            Some(row) => Ok((Order::try_from(row)?, true)),
            None => Ok((self.fetch_order(from.id).await?.ok_or(Error::OrderNotFound)?, false)),
        }
    }

    async fn overwrite_status(&self, id: OrderId, status: &OrderStatus) -> Result<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("UPDATE orders SET status = $2 WHERE id = $1 RETURNING id, user_id, total_price_cents, status, shipping_status, created_at, estimated_delivery")
            .bind(id).bind(status.as_str()).fetch_optional(&self.db).await?.map(Order::try_from).transpose()
    }

    async fn settle(&self, owner: UserId, id: OrderId, draft: PaymentDraft) -> Result<Settlement> {
        let mut tx = self.db.begin().await?;

        // Concurrent settlements serialise on the row lock; the loser re-checks the
        // predicate against the committed row and matches nothing.
        let claimed = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = 'Completed' WHERE id = $1 AND user_id = $2 AND status = 'Pending' \
             RETURNING id, user_id, total_price_cents, status, shipping_status, created_at, estimated_delivery")
            .bind(id).bind(owner).fetch_optional(&mut *tx).await?;

        let Some(row) = claimed else {
            let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 AND user_id = $2")
                .bind(id).bind(owner).fetch_optional(&mut *tx).await?;
            tx.rollback().await?;
            return Ok(match current {
                None => Settlement::NotFound,
                Some(status) => Settlement::AlreadyProcessed(OrderStatus::from(status)),
            });
        };

        // An order put back to Pending by a status override keeps its first payment.
        let already_paid: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM payments WHERE order_id = $1)")
            .bind(id).fetch_one(&mut *tx).await?;
        if already_paid {
            tx.rollback().await?;
            return Ok(Settlement::AlreadyProcessed(OrderStatus::Pending));
        }

        let order = Order::try_from(row)?;
        let payment = draft.settle(&order);
        sqlx::query("INSERT INTO payments (order_id, payment_id, payment_method, amount_cents, status, payment_date, transaction_details) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(payment.order_id).bind(payment.payment_id.as_str()).bind(payment.method.as_str())
            .bind(payment.amount.minor()).bind(payment.status.as_str()).bind(payment.payment_date)
            .bind(Json(&payment.transaction_details))
            .execute(&mut *tx).await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => Error::AlreadyProcessed,
                e => Error::from(e),
            })?;

        tx.commit().await?;
        Ok(Settlement::Settled { order, payment })
    }

    async fn payment_for(&self, id: OrderId) -> Result<Option<Payment>> {
        sqlx::query_as::<_, PaymentRow>("SELECT order_id, payment_id, payment_method, amount_cents, status, payment_date, transaction_details FROM payments WHERE order_id = $1 ORDER BY payment_date LIMIT 1")
            .bind(id).fetch_optional(&self.db).await?.map(Payment::try_from).transpose()
    }

    async fn purchaser(&self, user: UserId) -> Result<Purchaser> {
        let row: Option<(String, String)> = sqlx::query_as("SELECT username, email FROM users WHERE id = $1")
            .bind(user).fetch_optional(&self.db).await?;
        Ok(row.map(|(username, email)| Purchaser { username: Some(username), email: Some(email) }).unwrap_or_default())
    }
}
