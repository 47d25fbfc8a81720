//! EventBus: fan-out of engagement events to real-time subscribers.
//!
//! Delivery is at-most-once with no replay. A subscriber that falls more
//! than `capacity` events behind loses the oldest ones instead of slowing
//! the publisher down.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::Stream;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::catalogue::EngagementEvent;
use crate::types::PublishedEvent;

/// Where mutating operations send their state-change events.
///
/// `publish` must return without waiting on any subscriber.
pub trait EventBus: Send + Sync {
    fn publish(&self, event: &EngagementEvent);
}

impl<B: EventBus + ?Sized> EventBus for Arc<B> {
    fn publish(&self, event: &EngagementEvent) {
        (**self).publish(event)
    }
}

// ---------------------------------------------------------------------------
// BroadcastBus
// ---------------------------------------------------------------------------

/// Production bus backing the WebSocket channel.
pub struct BroadcastBus {
    sender: broadcast::Sender<PublishedEvent>,
    next_subscriber: AtomicU64,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            next_subscriber: AtomicU64::new(1),
        }
    }

    /// Register a subscriber. It sees only events published after this call.
    pub fn subscribe(&self) -> SubscriberHandle {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        debug!(subscriber = id, "Subscriber connected");
        SubscriberHandle {
            id,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn unsubscribe(&self, handle: SubscriberHandle) {
        debug!(subscriber = handle.id, "Subscriber disconnected");
        drop(handle);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus for BroadcastBus {
    fn publish(&self, event: &EngagementEvent) {
        let published = event.to_published();
        let name = published.name.clone();
        match self.sender.send(published) {
            Ok(receivers) => debug!(event = %name, receivers, "Published event"),
            // No subscribers connected. Nothing is buffered for later.
            Err(_) => trace!(event = %name, "Published event with no subscribers"),
        }
    }
}

// ---------------------------------------------------------------------------
// SubscriberHandle
// ---------------------------------------------------------------------------

pub struct SubscriberHandle {
    id: u64,
    receiver: broadcast::Receiver<PublishedEvent>,
}

impl SubscriberHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next event for this subscriber. Skips over anything lost to lag.
    /// Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<PublishedEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(subscriber = self.id, skipped, "Subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = PublishedEvent> + Send {
        let mut handle = self;
        async_stream::stream! {
            while let Some(event) = handle.recv().await {
                yield event;
            }
        }
    }
}
