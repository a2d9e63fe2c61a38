//! Order ledger and payment settlement operations.
//!
//! `OrderService` is what the HTTP handlers call. It owns no state beyond its
//! collaborators: the store, the event publisher and the shipping policy.

mod ledger;
mod settlement;

use std::sync::Arc;
use crate::domain::events::EventPublisher;
use crate::domain::shipping::ShippingPolicy;
use crate::store::OrderStore;

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    events: EventPublisher,
    policy: ShippingPolicy,
    status_override_admin_only: bool,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, events: EventPublisher, policy: ShippingPolicy) -> Self {
        Self { store, events, policy, status_override_admin_only: false }
    }

    /// Restricts `update_status` to admin callers.
    pub fn with_status_override_admin_only(mut self, enabled: bool) -> Self {
        self.status_override_admin_only = enabled;
        self
    }
}
