//! HTTP surface.

mod auth;
mod error;
mod orders;
mod payments;

pub use error::ApiError;

use axum::extract::FromRef;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use crate::identity::TokenVerifier;
use crate::service::OrderService;

#[derive(Clone)]
pub struct AppState {
    pub service: OrderService,
    pub tokens: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(service: OrderService, tokens: TokenVerifier) -> Self { Self { service, tokens: Arc::new(tokens) } }
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState) -> Self { state.tokens.clone() }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-orders"})) }))
        .route("/order/create", post(orders::create_order))
        .route("/order/history", get(orders::order_history))
        .route("/order/track/:order_id", get(orders::track_order))
        .route("/order/update/:order_id", put(orders::update_order_status))
        .route("/payment/process", post(payments::process_payment))
        .route("/payment/invoice/:order_id", get(payments::generate_invoice))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
