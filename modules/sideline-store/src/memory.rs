//! In-memory `DocumentStore`.
//!
//! One mutex over the whole state stands in for the database's transaction
//! isolation. Used by tests and by the API when no `DATABASE_URL` is set.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use sideline_common::{
    Account, AccountId, Challenge, ChallengeId, ContentId, ContentItem, Page, Reaction,
    ReactionKind, Vote,
};

use crate::error::{StoreError, StoreResult};
use crate::mutation::{apply_all, lock_order, Applied, AtomicUpdate, DocKey, Document};
use crate::store::DocumentStore;

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    content: HashMap<Uuid, ContentItem>,
    challenges: HashMap<Uuid, Challenge>,
    reactions: Vec<Reaction>,
    votes: Vec<Vote>,
}

impl State {
    fn document(&self, key: DocKey) -> Option<Document> {
        match key {
            DocKey::Account(id) => self.accounts.get(&id).cloned().map(Document::Account),
            DocKey::Content(id) => self.content.get(&id).cloned().map(Document::Content),
            DocKey::Challenge(id) => self.challenges.get(&id).cloned().map(Document::Challenge),
        }
    }

    fn put(&mut self, doc: Document) {
        match doc {
            Document::Account(a) => {
                self.accounts.insert(a.id, a);
            }
            Document::Content(c) => {
                self.content.insert(c.id, c);
            }
            Document::Challenge(c) => {
                self.challenges.insert(c.id, c);
            }
        }
    }

    /// Stage, apply, then commit. Nothing is written unless every update succeeds.
    fn apply(&mut self, updates: &[AtomicUpdate]) -> StoreResult<Vec<Applied>> {
        let mut staged = BTreeMap::new();
        for key in lock_order(updates) {
            let doc = self.document(key).ok_or(StoreError::NotFound(key))?;
            staged.insert(key, doc);
        }

        let results = apply_all(&mut staged, updates)?;

        for doc in staged.into_values() {
            self.put(doc);
        }
        Ok(results)
    }

    fn reaction_position(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
        kind: ReactionKind,
    ) -> Option<usize> {
        self.reactions
            .iter()
            .position(|r| r.actor_id == actor_id && r.content_id == content_id && r.kind == kind)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored votes for a challenge (for test assertions).
    pub async fn vote_count(&self, challenge_id: ChallengeId) -> usize {
        let state = self.state.lock().await;
        state
            .votes
            .iter()
            .filter(|v| v.challenge_id == challenge_id)
            .count()
    }

    /// All stored votes for a challenge, in insertion order (for test assertions).
    pub async fn votes_for(&self, challenge_id: ChallengeId) -> Vec<Vote> {
        let state = self.state.lock().await;
        state
            .votes
            .iter()
            .filter(|v| v.challenge_id == challenge_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.state.lock().await.accounts.get(&id).cloned())
    }

    async fn find_content(&self, id: ContentId) -> StoreResult<Option<ContentItem>> {
        Ok(self.state.lock().await.content.get(&id).cloned())
    }

    async fn find_challenge(&self, id: ChallengeId) -> StoreResult<Option<Challenge>> {
        Ok(self.state.lock().await.challenges.get(&id).cloned())
    }

    async fn insert_account(&self, account: &Account) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(&account.id) {
            return Err(StoreError::Conflict("accounts_pkey".into()));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn insert_content(&self, item: &ContentItem) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.content.contains_key(&item.id) {
            return Err(StoreError::Conflict("content_items_pkey".into()));
        }
        state.content.insert(item.id, item.clone());
        Ok(())
    }

    async fn insert_challenge(&self, challenge: &Challenge) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.challenges.contains_key(&challenge.id) {
            return Err(StoreError::Conflict("challenges_pkey".into()));
        }
        state.challenges.insert(challenge.id, challenge.clone());
        Ok(())
    }

    async fn set_notification_address(
        &self,
        id: AccountId,
        address: Option<String>,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::NotFound(DocKey::Account(id)))?;
        account.notification_address = address;
        Ok(())
    }

    async fn atomic_update(&self, update: AtomicUpdate) -> StoreResult<Applied> {
        let mut results = self.state.lock().await.apply(std::slice::from_ref(&update))?;
        results
            .pop()
            .ok_or_else(|| StoreError::Unavailable("empty update result".into()))
    }

    async fn atomic_update_all(&self, updates: Vec<AtomicUpdate>) -> StoreResult<Vec<Applied>> {
        self.state.lock().await.apply(&updates)
    }

    async fn find_reaction(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
        kind: ReactionKind,
    ) -> StoreResult<Option<Reaction>> {
        let state = self.state.lock().await;
        Ok(state
            .reaction_position(actor_id, content_id, kind)
            .map(|i| state.reactions[i].clone()))
    }

    async fn insert_reaction(
        &self,
        reaction: &Reaction,
        update: AtomicUpdate,
    ) -> StoreResult<Applied> {
        let mut state = self.state.lock().await;
        if state
            .reaction_position(reaction.actor_id, reaction.content_id, reaction.kind)
            .is_some()
        {
            return Err(StoreError::Conflict("reactions_pkey".into()));
        }
        let mut results = state.apply(std::slice::from_ref(&update))?;
        state.reactions.push(reaction.clone());
        results
            .pop()
            .ok_or_else(|| StoreError::Unavailable("empty update result".into()))
    }

    async fn delete_reaction(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
        kind: ReactionKind,
        update: AtomicUpdate,
    ) -> StoreResult<Option<Applied>> {
        let mut state = self.state.lock().await;
        let Some(position) = state.reaction_position(actor_id, content_id, kind) else {
            return Ok(None);
        };
        let mut results = state.apply(std::slice::from_ref(&update))?;
        state.reactions.remove(position);
        Ok(results.pop())
    }

    async fn reactions_for(&self, content_id: ContentId) -> StoreResult<Vec<Reaction>> {
        let state = self.state.lock().await;
        let mut reactions: Vec<Reaction> = state
            .reactions
            .iter()
            .filter(|r| r.content_id == content_id)
            .cloned()
            .collect();
        reactions.sort_by_key(|r| r.created_at);
        Ok(reactions)
    }

    async fn find_vote(
        &self,
        voter_id: AccountId,
        challenge_id: ChallengeId,
    ) -> StoreResult<Option<Vote>> {
        let state = self.state.lock().await;
        Ok(state
            .votes
            .iter()
            .find(|v| v.voter_id == voter_id && v.challenge_id == challenge_id)
            .cloned())
    }

    async fn insert_vote(&self, vote: &Vote, update: AtomicUpdate) -> StoreResult<Applied> {
        let mut state = self.state.lock().await;
        let duplicate = state
            .votes
            .iter()
            .any(|v| v.voter_id == vote.voter_id && v.challenge_id == vote.challenge_id);
        if duplicate {
            return Err(StoreError::Conflict("votes_voter_id_challenge_id_key".into()));
        }
        let mut results = state.apply(std::slice::from_ref(&update))?;
        state.votes.push(vote.clone());
        results
            .pop()
            .ok_or_else(|| StoreError::Unavailable("empty update result".into()))
    }

    async fn list_votes(&self, challenge_id: ChallengeId, page: Page) -> StoreResult<Vec<Vote>> {
        let state = self.state.lock().await;
        // Reverse insertion order first so equal timestamps still list newest first.
        let mut votes: Vec<Vote> = state
            .votes
            .iter()
            .rev()
            .filter(|v| v.challenge_id == challenge_id)
            .cloned()
            .collect();
        votes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(votes
            .into_iter()
            .skip(page.offset())
            .take(page.size as usize)
            .collect())
    }
}
