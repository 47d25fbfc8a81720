use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use expo_push::ExpoPushClient;
use sideline_common::{telemetry, Config};
use sideline_engagement::{EngagementDeps, NotificationDispatcher};
use sideline_events::{BroadcastBus, EventBus};
use sideline_store::{DocumentStore, MemoryStore, PgDocumentStore};

mod app;
mod auth;
mod error;
mod extract;
mod rest;
mod ws;

pub use app::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let config = Config::from_env()?;

    let store: Arc<dyn DocumentStore> = match config.database_url.as_deref() {
        Some(url) => {
            let store = PgDocumentStore::connect(url).await?;
            store.migrate().await?;
            info!("Connected to Postgres");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };

    let bus = Arc::new(BroadcastBus::new(config.event_bus_capacity));

    let push = ExpoPushClient::new(&config.expo_push_url, config.expo_access_token.as_deref())?;
    let notifier = NotificationDispatcher::new(Arc::new(push), config.notification_timeout);

    let deps = EngagementDeps::builder()
        .store(store)
        .bus(bus.clone() as Arc<dyn EventBus>)
        .notifier(notifier)
        .earnings_rate(config.earnings_rate)
        .build();

    let state = Arc::new(AppState { deps, bus });
    let router = app::router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Sideline API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
