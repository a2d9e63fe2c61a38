//! OpenSASE Orders - order lifecycle and payment settlement service

use anyhow::Result;
use opensase_orders::api::{self, AppState};
use opensase_orders::config::Config;
use opensase_orders::domain::events::EventPublisher;
use opensase_orders::identity::TokenVerifier;
use opensase_orders::service::OrderService;
use opensase_orders::store::PgOrderStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = Config::from_env()?;
    let db = PgPoolOptions::new().max_connections(config.max_connections).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, order events will not be published");
                None
            }
        },
        None => None,
    };

    let service = OrderService::new(Arc::new(PgOrderStore::new(db)), EventPublisher::new(nats), config.shipping_policy())
        .with_status_override_admin_only(config.status_override_admin_only);
    let app = api::router(AppState::new(service, TokenVerifier::hs256(config.jwt_secret.as_bytes())));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("🚀 OpenSASE Orders listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
