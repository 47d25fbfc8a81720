use std::sync::{Mutex, PoisonError};

use crate::bus::EventBus;
use crate::catalogue::EngagementEvent;
use crate::types::PublishedEvent;

/// In-memory recorder for tests. Keeps every published event in order.
#[derive(Default)]
pub struct MemoryEventBus {
    events: Mutex<Vec<PublishedEvent>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// All published events (for test assertions).
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Published events with the given wire name.
    pub fn named(&self, name: &str) -> Vec<PublishedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.name == name)
            .collect()
    }
}

impl EventBus for MemoryEventBus {
    fn publish(&self, event: &EngagementEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.to_published());
    }
}
