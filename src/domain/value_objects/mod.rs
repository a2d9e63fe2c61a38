//! Value Objects for order settlement

use rand::Rng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Identity claim of the account that owns an order.
pub type UserId = i64;

/// Catalog identifier of a product. The catalog itself lives in another service.
pub type ProductId = i64;

/// Money value object, held as integer minor units (cents).
///
/// On the wire amounts travel as JSON numbers with two decimals; conversion from
/// floats happens once, at the edge, with midpoint-away-from-zero rounding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Self { Self(minor) }
    pub fn minor(&self) -> i64 { self.0 }
    pub fn to_decimal(&self) -> Decimal { Decimal::new(self.0, 2) }

    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        let cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero) * Decimal::ONE_HUNDRED;
        cents.to_i64().map(Self).ok_or(MoneyError::OutOfRange)
    }

    pub fn from_f64(amount: f64) -> Result<Self, MoneyError> {
        if !amount.is_finite() { return Err(MoneyError::NotFinite); }
        let amount = Decimal::from_f64(amount).ok_or(MoneyError::OutOfRange)?;
        Self::from_decimal(amount)
    }

    pub fn is_negative(&self) -> bool { self.0 < 0 }

    pub fn add(&self, other: Money) -> Result<Money, MoneyError> {
        self.0.checked_add(other.0).map(Money).ok_or(MoneyError::OutOfRange)
    }

    pub fn multiply(&self, qty: Quantity) -> Result<Money, MoneyError> {
        self.0.checked_mul(i64::from(qty.value())).map(Money).ok_or(MoneyError::OutOfRange)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.to_decimal()) }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.to_decimal().to_f64().ok_or_else(|| ser::Error::custom("amount not representable"))?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_f64(value).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount is not a finite number")]
    NotFinite,
    #[error("amount out of range")]
    OutOfRange,
}

/// Quantity value object. Order lines always carry at least one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 { return Err(QuantityError::Zero); }
        Ok(Self(value))
    }
    pub fn value(&self) -> u32 { self.0 }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let value = u32::try_from(value).map_err(|_| QuantityError::OutOfRange(value))?;
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("quantity must be at least 1")]
    Zero,
    #[error("quantity out of range: {0}")]
    OutOfRange(i64),
}

/// Gateway-style payment identifier, e.g. `PAY-0192F3A4B5C67D8E9F0A1B2C3D4E5F60`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReference(String);

impl PaymentReference {
    pub fn generate() -> Self {
        Self(format!("PAY-{}", Uuid::now_v7().simple().to_string().to_uppercase()))
    }
    pub fn from_stored(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Invoice number. Invoices are views, so a new number is drawn on every render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    pub fn generate() -> Self { Self(format!("INV-{:08}", rand::thread_rng().gen_range(0..100_000_000u32))) }
    pub fn as_str(&self) -> &str { &self.0 }
}
