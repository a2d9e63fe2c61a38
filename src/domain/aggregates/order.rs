//! Order Aggregate

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::domain::aggregates::cart::PricedCart;
use crate::domain::value_objects::{Money, ProductId, Quantity, UserId};

pub type OrderId = Uuid;

/// Coarse order status. `Pending` and `Completed` are the lifecycle states; the
/// status override endpoint may store any other label verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self { Self::Pending => "Pending", Self::Completed => "Completed", Self::Other(s) => s }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.as_str() { "Pending" => Self::Pending, "Completed" => Self::Completed, _ => Self::Other(value) }
    }
}

impl From<&str> for OrderStatus {
    fn from(value: &str) -> Self { Self::from(value.to_string()) }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self { value.as_str().to_string() }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShippingStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
}

impl ShippingStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Processing => "Processing", Self::Shipped => "Shipped", Self::Delivered => "Delivered" }
    }
}

impl FromStr for ShippingStatus {
    type Err = UnknownShippingStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            other => Err(UnknownShippingStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ShippingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shipping status: {0}")]
pub struct UnknownShippingStatus(pub String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub owner: UserId,
    pub total_price: Money,
    pub status: OrderStatus,
    pub shipping_status: ShippingStatus,
    pub created_at: DateTime<Utc>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// An order and its lines, ready to be written in one unit of work.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Order line as read back for history and invoices, with the catalog name joined in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[derive(Clone, Debug)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderLine>,
}

impl Order {
    /// Builds a pending order from a priced cart. Items inherit the snapshot prices.
    pub fn place(owner: UserId, cart: &PricedCart, now: DateTime<Utc>, delivery_window: Duration) -> NewOrder {
        let order = Order {
            id: Uuid::now_v7(),
            owner,
            total_price: cart.total(),
            status: OrderStatus::Pending,
            shipping_status: ShippingStatus::Processing,
            created_at: now,
            estimated_delivery: Some(now + delivery_window),
        };
        let items = cart.lines().iter().map(|line| OrderItem {
            order_id: order.id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal,
        }).collect();
        NewOrder { order, items }
    }

    pub fn is_payable(&self) -> bool { self.status == OrderStatus::Pending }
    pub fn is_completed(&self) -> bool { self.status == OrderStatus::Completed }

    pub fn estimated_delivery_or_default(&self, delivery_window: Duration) -> DateTime<Utc> {
        self.estimated_delivery.unwrap_or(self.created_at + delivery_window)
    }
}
