//! OpenSASE Orders
//!
//! Order lifecycle and payment settlement for the OpenSASE e-commerce platform.
//!
//! ## Features
//! - Checkout from a priced cart snapshot
//! - Order history and lazily advanced shipment tracking
//! - Single-shot simulated payment settlement
//! - Invoice rendering for settled orders
//!
//! Accounts, catalog and token issuance belong to other services; this crate reads
//! product names and purchaser details from their tables and verifies bearer tokens.

pub mod api;
pub mod config;
pub mod domain;
pub mod identity;
pub mod service;
pub mod store;

use thiserror::Error;
use crate::domain::aggregates::{CartError, InvoiceError};
use crate::domain::value_objects::ProductId;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("{0}")]
    Validation(String),

    #[error("Order not found")]
    OrderNotFound,

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Order has already been processed")]
    AlreadyProcessed,

    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    #[error("Missing or invalid bearer token")]
    Unauthorized,

    #[error("Not allowed to perform this operation")]
    Forbidden,

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Coarse classification used by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cart(_) | Self::Validation(_) => ErrorKind::Validation,
            Self::OrderNotFound | Self::ProductNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyProcessed | Self::Invoice(_) => ErrorKind::Conflict,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self { Self::Storage(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
