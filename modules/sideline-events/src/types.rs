//! What subscribers receive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named event with its JSON payload, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
    pub name: String,
    pub payload: serde_json::Value,
    pub published_at: DateTime<Utc>,
}

impl PublishedEvent {
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
            published_at: Utc::now(),
        }
    }

    /// The frame written to a WebSocket: `{"event": name, "data": payload}`.
    pub fn to_frame(&self) -> serde_json::Value {
        serde_json::json!({
            "event": self.name,
            "data": self.payload,
        })
    }
}
