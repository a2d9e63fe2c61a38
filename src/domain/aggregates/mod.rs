//! Aggregates module
pub mod cart;
pub mod order;
pub mod payment;

pub use cart::{CartError, CartLine, CartSnapshot, PricedCart, PricedLine, ProductSnapshot};
pub use order::{NewOrder, Order, OrderDetails, OrderId, OrderItem, OrderLine, OrderStatus, ShippingStatus};
pub use payment::{Invoice, InvoiceError, Payment, PaymentDraft, PaymentMethod, PaymentStatus, Purchaser, Settlement};
