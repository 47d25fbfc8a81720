//! Best-effort push notifications.
//!
//! Business logic hands a `PushMessage` to the dispatcher and moves on.
//! Delivery happens on a spawned task with a bounded timeout; failures are
//! logged and never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use expo_push::{ExpoPushClient, PushMessage};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Anything that can deliver a push message.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn push(&self, message: &PushMessage) -> expo_push::Result<()>;
}

#[async_trait]
impl PushGateway for ExpoPushClient {
    async fn push(&self, message: &PushMessage) -> expo_push::Result<()> {
        self.send(message).await.map(|_| ())
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    gateway: Option<Arc<dyn PushGateway>>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(gateway: Arc<dyn PushGateway>, timeout: Duration) -> Self {
        Self {
            gateway: Some(gateway),
            timeout,
        }
    }

    /// A dispatcher that drops every message.
    pub fn disabled() -> Self {
        Self {
            gateway: None,
            timeout: Duration::ZERO,
        }
    }

    /// Fire and forget. The handle is only useful to tests that want to
    /// wait for the attempt to finish.
    pub fn dispatch(&self, message: PushMessage) -> Option<JoinHandle<()>> {
        let Some(gateway) = self.gateway.clone() else {
            debug!(title = %message.title, "Push gateway disabled, dropping notification");
            return None;
        };
        let timeout = self.timeout;

        Some(tokio::spawn(async move {
            match tokio::time::timeout(timeout, gateway.push(&message)).await {
                Ok(Ok(())) => debug!(title = %message.title, "Push notification sent"),
                Ok(Err(e)) if e.is_device_not_registered() => info!(
                    to = %message.to,
                    "Push token no longer registered, notification dropped"
                ),
                Ok(Err(e)) => warn!(error = %e, title = %message.title, "Push notification failed"),
                Err(_) => warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    title = %message.title,
                    "Push notification timed out"
                ),
            }
        }))
    }
}
