use std::sync::Arc;

use sideline_events::EventBus;
use sideline_store::DocumentStore;
use typed_builder::TypedBuilder;

use crate::ledger::RelationshipLedger;
use crate::notify::NotificationDispatcher;
use crate::poll::PollEngine;
use crate::scorer::EngagementScorer;

/// Shared dependency container for the engagement core.
///
/// Holds long-lived, cloneable resources. The ledger, poll engine and
/// scorer are cheap views built from these on demand.
#[derive(Clone, TypedBuilder)]
pub struct EngagementDeps {
    pub store: Arc<dyn DocumentStore>,
    pub bus: Arc<dyn EventBus>,
    #[builder(default = NotificationDispatcher::disabled())]
    pub notifier: NotificationDispatcher,
    #[builder(default = 0.05)]
    pub earnings_rate: f64,
}

impl EngagementDeps {
    pub fn ledger(&self) -> RelationshipLedger {
        RelationshipLedger::new(self.clone())
    }

    pub fn polls(&self) -> PollEngine {
        PollEngine::new(self.clone())
    }

    pub fn scorer(&self) -> EngagementScorer {
        EngagementScorer::new(self.earnings_rate)
    }
}
