//! Cart snapshot and pricing
//!
//! The cart is supplied by the client together with the price it saw for each
//! product. That price is what the order is charged at: later catalog edits never
//! reach an order once it has been priced.

use serde::Deserialize;
use validator::Validate;
use crate::domain::value_objects::{Money, MoneyError, ProductId, Quantity};

/// `POST /order/create` payload.
#[derive(Debug, Default, Deserialize)]
pub struct CartSnapshot {
    pub cart_items: Option<Vec<CartLine>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CartLine {
    pub product_id: ProductId,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i64,
    #[validate]
    pub product: ProductSnapshot,
}

/// Product as the client saw it when the cart was built.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductSnapshot {
    #[serde(default)]
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Lines priced at snapshot time. `total` is the sum of the line subtotals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricedCart {
    lines: Vec<PricedLine>,
    total: Money,
}

impl PricedCart {
    pub fn lines(&self) -> &[PricedLine] { &self.lines }
    pub fn total(&self) -> Money { self.total }
    pub fn product_ids(&self) -> Vec<ProductId> { self.lines.iter().map(|l| l.product_id).collect() }
}

impl CartSnapshot {
    pub fn price(&self) -> Result<PricedCart, CartError> {
        let items = self.cart_items.as_ref().ok_or(CartError::MissingItems)?;
        if items.is_empty() { return Err(CartError::Empty); }

        let mut lines = Vec::with_capacity(items.len());
        let mut total = Money::ZERO;
        for (index, item) in items.iter().enumerate() {
            item.validate().map_err(|e| CartError::InvalidLine { index, reason: e.to_string() })?;
            let quantity = Quantity::try_from(item.quantity)
                .map_err(|e| CartError::InvalidLine { index, reason: e.to_string() })?;
            let unit_price = Money::from_f64(item.product.price)?;
            let subtotal = unit_price.multiply(quantity)?;
            total = total.add(subtotal)?;
            lines.push(PricedLine { product_id: item.product_id, quantity, unit_price, subtotal });
        }
        Ok(PricedCart { lines, total })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("cart_items is required")]
    MissingItems,
    #[error("Cart is empty")]
    Empty,
    #[error("Invalid cart item {index}: {reason}")]
    InvalidLine { index: usize, reason: String },
    #[error("Invalid cart amount: {0}")]
    Amount(#[from] MoneyError),
}
