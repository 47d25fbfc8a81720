use async_trait::async_trait;

use sideline_common::{
    Account, AccountId, Challenge, ChallengeId, ContentId, ContentItem, Page, Reaction,
    ReactionKind, Vote,
};

use crate::error::StoreResult;
use crate::mutation::{Applied, AtomicUpdate};

/// Persistence boundary for the engagement core.
///
/// Implemented by `PgDocumentStore` (Postgres) and `MemoryStore` (tests,
/// local runs). Implementations guarantee:
/// - `atomic_update` is all-or-nothing for its single document;
/// - `atomic_update_all` is all-or-nothing across every document it names;
/// - `insert_vote` rejects a second vote for the same (voter, challenge)
///   with `StoreError::Conflict`, and `insert_reaction` rejects a second
///   reaction for the same (actor, content, kind) the same way. The paired
///   update commits in the same unit as the insert.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>>;
    async fn find_content(&self, id: ContentId) -> StoreResult<Option<ContentItem>>;
    async fn find_challenge(&self, id: ChallengeId) -> StoreResult<Option<Challenge>>;

    async fn insert_account(&self, account: &Account) -> StoreResult<()>;
    async fn insert_content(&self, item: &ContentItem) -> StoreResult<()>;
    async fn insert_challenge(&self, challenge: &Challenge) -> StoreResult<()>;

    /// Replace the account's push token. `NotFound` if the account is absent.
    async fn set_notification_address(
        &self,
        id: AccountId,
        address: Option<String>,
    ) -> StoreResult<()>;

    async fn atomic_update(&self, update: AtomicUpdate) -> StoreResult<Applied>;

    /// Results come back in the order the updates were given.
    async fn atomic_update_all(&self, updates: Vec<AtomicUpdate>) -> StoreResult<Vec<Applied>>;

    async fn find_reaction(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
        kind: ReactionKind,
    ) -> StoreResult<Option<Reaction>>;

    async fn insert_reaction(&self, reaction: &Reaction, update: AtomicUpdate)
        -> StoreResult<Applied>;

    /// Delete the reaction record and apply `update`. Returns `None` (and
    /// applies nothing) when no record existed.
    async fn delete_reaction(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
        kind: ReactionKind,
        update: AtomicUpdate,
    ) -> StoreResult<Option<Applied>>;

    /// Every active reaction on a content item, oldest first.
    async fn reactions_for(&self, content_id: ContentId) -> StoreResult<Vec<Reaction>>;

    async fn find_vote(
        &self,
        voter_id: AccountId,
        challenge_id: ChallengeId,
    ) -> StoreResult<Option<Vote>>;

    async fn insert_vote(&self, vote: &Vote, update: AtomicUpdate) -> StoreResult<Applied>;

    /// Votes for a challenge, newest first.
    async fn list_votes(&self, challenge_id: ChallengeId, page: Page) -> StoreResult<Vec<Vote>>;
}
