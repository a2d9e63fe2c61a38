//! Payment Aggregate and invoice view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::domain::aggregates::order::{Order, OrderId, OrderLine, OrderStatus};
use crate::domain::value_objects::{InvoiceNumber, Money, PaymentReference};

const PLACEHOLDER_ADDRESS: &str = "123 Fake Street, Springfield, USA";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Completed, Failed, Refunded }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { #[default] CreditCard, Paypal }

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Completed => "completed", Self::Failed => "failed", Self::Refunded => "refunded" }
    }
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::CreditCard => "credit_card", Self::Paypal => "paypal" }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentField;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownPaymentField::Status(other.to_string())),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentField;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(Self::CreditCard),
            "paypal" => Ok(Self::Paypal),
            other => Err(UnknownPaymentField::Method(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnknownPaymentField {
    #[error("unknown payment status: {0}")]
    Status(String),
    #[error("unknown payment method: {0}")]
    Method(String),
}

/// Settlement record. Written once, never updated.
#[derive(Clone, Debug, PartialEq)]
pub struct Payment {
    pub order_id: OrderId,
    pub payment_id: PaymentReference,
    pub method: PaymentMethod,
    pub amount: Money,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub transaction_details: serde_json::Value,
}

/// Everything about a payment except the amount, which is read from the order
/// inside the settling transaction.
#[derive(Clone, Debug)]
pub struct PaymentDraft {
    pub payment_id: PaymentReference,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub transaction_details: serde_json::Value,
}

impl PaymentDraft {
    /// Simulated gateway charge: always succeeds on a credit card.
    pub fn simulated(now: DateTime<Utc>) -> Self {
        Self {
            payment_id: PaymentReference::generate(),
            method: PaymentMethod::CreditCard,
            status: PaymentStatus::Completed,
            payment_date: now,
            transaction_details: serde_json::json!({ "simulated": true }),
        }
    }

    pub fn settle(self, order: &Order) -> Payment {
        Payment {
            order_id: order.id,
            payment_id: self.payment_id,
            method: self.method,
            amount: order.total_price,
            status: self.status,
            payment_date: self.payment_date,
            transaction_details: self.transaction_details,
        }
    }
}

/// Outcome of the conditional Pending -> Completed update.
#[derive(Clone, Debug)]
pub enum Settlement {
    Settled { order: Order, payment: Payment },
    NotFound,
    AlreadyProcessed(OrderStatus),
}

/// Purchaser identity as known to the accounts service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Purchaser {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct InvoiceLine {
    pub product_name: Option<String>,
    pub quantity: u32,
    pub price: Money,
    pub subtotal: Money,
}

#[derive(Clone, Debug, Serialize)]
pub struct Invoice {
    pub invoice_id: InvoiceNumber,
    pub order_id: OrderId,
    pub user: Purchaser,
    pub total_price: Money,
    pub payment_id: PaymentReference,
    pub payment_method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub items: Vec<InvoiceLine>,
    pub billing_address: String,
    pub shipping_address: String,
}

impl Invoice {
    /// Renders an invoice for a completed, paid order. Nothing is stored.
    pub fn assemble(order: &Order, lines: &[OrderLine], payment: Option<&Payment>, user: Purchaser) -> Result<Self, InvoiceError> {
        if !order.is_completed() { return Err(InvoiceError::NotCompleted); }
        let payment = payment.ok_or(InvoiceError::PaymentMissing)?;
        Ok(Self {
            invoice_id: InvoiceNumber::generate(),
            order_id: order.id,
            user,
            total_price: order.total_price,
            payment_id: payment.payment_id.clone(),
            payment_method: payment.method,
            payment_date: payment.payment_date,
            items: lines.iter().map(|l| InvoiceLine {
                product_name: l.product_name.clone(),
                quantity: l.quantity.value(),
                price: l.unit_price,
                subtotal: l.subtotal,
            }).collect(),
            billing_address: PLACEHOLDER_ADDRESS.to_string(),
            shipping_address: PLACEHOLDER_ADDRESS.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvoiceError {
    #[error("Invoice can only be generated for completed orders")]
    NotCompleted,
    #[error("No payment recorded for this order")]
    PaymentMissing,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::ShippingStatus;
    use crate::domain::value_objects::Quantity;
    use uuid::Uuid;

    fn order(status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::now_v7(), owner: 9, total_price: Money::from_minor(10_000), status,
            shipping_status: ShippingStatus::Processing, created_at: now, estimated_delivery: None,
        }
    }

    #[test]
    fn test_simulated_settlement() {
        let order = order(OrderStatus::Pending);
        let payment = PaymentDraft::simulated(Utc::now()).settle(&order);
        assert_eq!(payment.amount, Money::from_minor(10_000));
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.method, PaymentMethod::CreditCard);
        assert_eq!(payment.order_id, order.id);
        assert_eq!(payment.transaction_details["simulated"], true);
    }

    #[test]
    fn test_invoice_requires_completed_order() {
        let pending = order(OrderStatus::Pending);
        let payment = PaymentDraft::simulated(Utc::now()).settle(&pending);
        let err = Invoice::assemble(&pending, &[], Some(&payment), Purchaser::default()).unwrap_err();
        assert_eq!(err.to_string(), "Invoice can only be generated for completed orders");
        let err = Invoice::assemble(&order(OrderStatus::Completed), &[], None, Purchaser::default()).unwrap_err();
        assert_eq!(err, InvoiceError::PaymentMissing);
    }

    #[test]
    fn test_invoice_view() {
        let order = order(OrderStatus::Completed);
        let payment = PaymentDraft::simulated(Utc::now()).settle(&order);
        let lines = vec![OrderLine {
            product_id: 1, product_name: Some("Widget".into()), quantity: Quantity::new(4).unwrap(),
            unit_price: Money::from_minor(2500), subtotal: Money::from_minor(10_000),
        }];
        let user = Purchaser { username: Some("ada".into()), email: Some("ada@example.com".into()) };
        let invoice = Invoice::assemble(&order, &lines, Some(&payment), user).unwrap();
        let json = serde_json::to_value(&invoice).unwrap();
        assert!(json["invoice_id"].as_str().unwrap().starts_with("INV-"));
        assert_eq!(json["total_price"], 100.0);
        assert_eq!(json["payment_method"], "credit_card");
        assert_eq!(json["user"]["username"], "ada");
        assert_eq!(json["items"][0]["price"], 25.0);
        assert_eq!(json["items"][0]["quantity"], 4);
        assert_eq!(json["billing_address"], PLACEHOLDER_ADDRESS);
    }

    #[test]
    fn test_payment_labels_round_trip_through_storage_names() {
        assert_eq!("completed".parse::<PaymentStatus>().unwrap(), PaymentStatus::Completed);
        assert_eq!(PaymentMethod::CreditCard.as_str(), "credit_card");
        assert!("cash".parse::<PaymentMethod>().is_err());
    }
}
