//! Real-time event plumbing for the engagement core.
//!
//! Mutating operations hand an `EngagementEvent` to an injected `EventBus`.
//! The production bus fans events out to connected WebSocket subscribers;
//! tests inject a `MemoryEventBus` and assert on what was published.
//!
//! Event names and payload keys are a wire contract shared with existing
//! mobile clients. They are defined in one place: `catalogue`.

pub mod bus;
pub mod catalogue;
pub mod memory;
pub mod types;

pub use bus::{BroadcastBus, EventBus, SubscriberHandle};
pub use catalogue::{ChallengeCreator, EngagementEvent, VoterSummary};
pub use memory::MemoryEventBus;
pub use types::PublishedEvent;
