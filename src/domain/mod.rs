//! Order lifecycle domain: pricing, ledger records, shipping progression, settlement.
pub mod aggregates;
pub mod events;
pub mod shipping;
pub mod value_objects;
