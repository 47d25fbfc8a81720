//! Engagement & voting core.
//!
//! - `RelationshipLedger`: follow, like and dislike toggles that keep each
//!   membership set and its counter in lockstep.
//! - `PollEngine`: time-gated challenges with one vote per user.
//! - `EngagementScorer`: daily points and earnings from reaction history.
//! - `NotificationDispatcher`: fire-and-forget push delivery.
//!
//! All of them are built from an `EngagementDeps`.

pub mod deps;
pub mod ledger;
pub mod notify;
pub mod poll;
pub mod scorer;

pub use deps::EngagementDeps;
pub use ledger::{FollowOutcome, ReactionOutcome, RelationshipLedger};
pub use notify::{NotificationDispatcher, PushGateway};
pub use poll::{
    ChallengeResults, ChallengeState, NewChallenge, NewQuestion, OptionTally, PollEngine,
    QuestionTally,
};
pub use scorer::{DayBucket, EngagementReport, EngagementScorer, Rollup, Weights};
