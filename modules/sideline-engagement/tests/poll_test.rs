//! PollEngine behavior: time gate, duplicate votes, option validation, tallies.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use sideline_common::{
    Account, AccountId, Challenge, ChallengeId, ContentId, ContentItem, Page, Reaction,
    ReactionKind, SidelineError, Vote,
};
use sideline_engagement::{ChallengeState, EngagementDeps, NewChallenge, NewQuestion};
use sideline_events::catalogue::{NEW_CHALLENGE_CREATED, NEW_VOTE_CREATED};
use sideline_events::MemoryEventBus;
use sideline_store::{
    Applied, AtomicUpdate, DocumentStore, MemoryStore, StoreResult,
};

// Challenge opens for voting until 2026-07-01 18:00 UTC, closes 2026-07-02.
fn before_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 30, 12, 0, 0).unwrap()
}

fn effective_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 1, 18, 0, 0).unwrap()
}

fn new_challenge() -> NewChallenge {
    NewChallenge {
        title: "Derby day".into(),
        description: "Call the derby".into(),
        questions: vec![
            NewQuestion {
                text: "Who wins?".into(),
                options: vec!["Home".into(), "Away".into()],
            },
            NewQuestion {
                text: "Both teams score?".into(),
                options: vec!["Yes".into(), "No".into()],
            },
        ],
        start_date: Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap(),
        end_date: Utc.with_ymd_and_hms(2026, 7, 2, 0, 0, 0).unwrap(),
        time_of_day: chrono::NaiveTime::from_hms_opt(18, 0, 0),
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    bus: Arc<MemoryEventBus>,
    deps: EngagementDeps,
    challenge: Challenge,
}

async fn harness_on(store: Arc<dyn DocumentStore>, memory: Arc<MemoryStore>) -> Harness {
    let bus = Arc::new(MemoryEventBus::new());
    let deps = EngagementDeps::builder().store(store).bus(bus.clone()).build();

    let owner = Account::new("club").as_owner();
    memory.insert_account(&owner).await.unwrap();
    let challenge = deps
        .polls()
        .create_challenge(owner.id, new_challenge(), before_start())
        .await
        .unwrap();

    Harness {
        store: memory,
        bus,
        deps,
        challenge,
    }
}

async fn harness() -> Harness {
    let memory = Arc::new(MemoryStore::new());
    harness_on(memory.clone(), memory).await
}

async fn voter(store: &MemoryStore) -> Account {
    let account = Account::new("fan").with_avatar("https://cdn.example/fan.png");
    store.insert_account(&account).await.unwrap();
    account
}

fn answer(challenge: &Challenge, question: usize, option: usize) -> (Uuid, Uuid) {
    let q = &challenge.questions[question];
    (q.id, q.options[option].id)
}

async fn stored(h: &Harness) -> Challenge {
    h.store.find_challenge(h.challenge.id).await.unwrap().unwrap()
}

/// Delegates to a `MemoryStore` but never reports an existing vote, so only
/// the unique index can stop a duplicate.
struct IndexOnly(Arc<MemoryStore>);

#[async_trait]
impl DocumentStore for IndexOnly {
    async fn find_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        self.0.find_account(id).await
    }
    async fn find_content(&self, id: ContentId) -> StoreResult<Option<ContentItem>> {
        self.0.find_content(id).await
    }
    async fn find_challenge(&self, id: ChallengeId) -> StoreResult<Option<Challenge>> {
        self.0.find_challenge(id).await
    }
    async fn insert_account(&self, account: &Account) -> StoreResult<()> {
        self.0.insert_account(account).await
    }
    async fn insert_content(&self, item: &ContentItem) -> StoreResult<()> {
        self.0.insert_content(item).await
    }
    async fn insert_challenge(&self, challenge: &Challenge) -> StoreResult<()> {
        self.0.insert_challenge(challenge).await
    }
    async fn set_notification_address(
        &self,
        id: AccountId,
        address: Option<String>,
    ) -> StoreResult<()> {
        self.0.set_notification_address(id, address).await
    }
    async fn atomic_update(&self, update: AtomicUpdate) -> StoreResult<Applied> {
        self.0.atomic_update(update).await
    }
    async fn atomic_update_all(&self, updates: Vec<AtomicUpdate>) -> StoreResult<Vec<Applied>> {
        self.0.atomic_update_all(updates).await
    }
    async fn find_reaction(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
        kind: ReactionKind,
    ) -> StoreResult<Option<Reaction>> {
        self.0.find_reaction(actor_id, content_id, kind).await
    }
    async fn insert_reaction(
        &self,
        reaction: &Reaction,
        update: AtomicUpdate,
    ) -> StoreResult<Applied> {
        self.0.insert_reaction(reaction, update).await
    }
    async fn delete_reaction(
        &self,
        actor_id: AccountId,
        content_id: ContentId,
        kind: ReactionKind,
        update: AtomicUpdate,
    ) -> StoreResult<Option<Applied>> {
        self.0.delete_reaction(actor_id, content_id, kind, update).await
    }
    async fn reactions_for(&self, content_id: ContentId) -> StoreResult<Vec<Reaction>> {
        self.0.reactions_for(content_id).await
    }
    async fn find_vote(
        &self,
        _voter_id: AccountId,
        _challenge_id: ChallengeId,
    ) -> StoreResult<Option<Vote>> {
        Ok(None)
    }
    async fn insert_vote(&self, vote: &Vote, update: AtomicUpdate) -> StoreResult<Applied> {
        self.0.insert_vote(vote, update).await
    }
    async fn list_votes(&self, challenge_id: ChallengeId, page: Page) -> StoreResult<Vec<Vote>> {
        self.0.list_votes(challenge_id, page).await
    }
}

// =========================================================================
// Voting
// =========================================================================

#[tokio::test]
async fn first_vote_tallies_its_option_and_the_challenge() {
    let h = harness().await;
    let v = voter(&h.store).await;
    let (q1, x) = answer(&h.challenge, 0, 0);

    let vote = h
        .deps
        .polls()
        .submit_vote(v.id, h.challenge.id, BTreeMap::from([(q1, x)]), before_start())
        .await
        .unwrap();
    assert_eq!(vote.voter_id, v.id);

    let c = stored(&h).await;
    assert_eq!(c.questions[0].options[0].voters.size(), 1);
    assert_eq!(c.questions[0].options[1].voters.size(), 0);
    assert_eq!(c.vote_count(), 1);
}

#[tokio::test]
async fn second_vote_is_a_duplicate_and_changes_nothing() {
    let h = harness().await;
    let v = voter(&h.store).await;
    let polls = h.deps.polls();
    let (q1, x) = answer(&h.challenge, 0, 0);
    let (_, y) = answer(&h.challenge, 0, 1);

    polls
        .submit_vote(v.id, h.challenge.id, BTreeMap::from([(q1, x)]), before_start())
        .await
        .unwrap();
    let err = polls
        .submit_vote(v.id, h.challenge.id, BTreeMap::from([(q1, y)]), before_start())
        .await
        .unwrap_err();
    assert_eq!(err, SidelineError::DuplicateVote);

    let c = stored(&h).await;
    assert_eq!(c.questions[0].options[0].voters.size(), 1);
    assert_eq!(c.questions[0].options[1].voters.size(), 0);
    assert_eq!(c.vote_count(), 1);
    assert_eq!(h.store.vote_count(h.challenge.id).await, 1);
}

#[tokio::test]
async fn unique_index_catches_what_the_precheck_misses() {
    let memory = Arc::new(MemoryStore::new());
    let h = harness_on(Arc::new(IndexOnly(memory.clone())), memory).await;
    let v = voter(&h.store).await;
    let polls = h.deps.polls();
    let (q1, x) = answer(&h.challenge, 0, 0);

    polls
        .submit_vote(v.id, h.challenge.id, BTreeMap::from([(q1, x)]), before_start())
        .await
        .unwrap();
    let err = polls
        .submit_vote(v.id, h.challenge.id, BTreeMap::from([(q1, x)]), before_start())
        .await
        .unwrap_err();

    assert_eq!(err, SidelineError::DuplicateVote);
    assert_eq!(h.store.vote_count(h.challenge.id).await, 1);
    assert_eq!(stored(&h).await.vote_count(), 1);
}

#[tokio::test]
async fn concurrent_duplicate_votes_store_exactly_one() {
    let memory = Arc::new(MemoryStore::new());
    let h = harness_on(Arc::new(IndexOnly(memory.clone())), memory).await;
    let v = voter(&h.store).await;
    let (q1, x) = answer(&h.challenge, 0, 0);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let polls = h.deps.polls();
        let (voter_id, challenge_id) = (v.id, h.challenge.id);
        handles.push(tokio::spawn(async move {
            polls
                .submit_vote(voter_id, challenge_id, BTreeMap::from([(q1, x)]), before_start())
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(e) => assert_eq!(e, SidelineError::DuplicateVote),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(h.store.vote_count(h.challenge.id).await, 1);
}

#[tokio::test]
async fn option_from_another_question_is_invalid() {
    let h = harness().await;
    let v = voter(&h.store).await;
    let (q1, _) = answer(&h.challenge, 0, 0);
    let (_, yes) = answer(&h.challenge, 1, 0);

    let err = h
        .deps
        .polls()
        .submit_vote(v.id, h.challenge.id, BTreeMap::from([(q1, yes)]), before_start())
        .await
        .unwrap_err();

    assert_eq!(err, SidelineError::InvalidOption { question_id: q1 });
    assert_eq!(h.store.vote_count(h.challenge.id).await, 0);
    let c = stored(&h).await;
    assert!(c
        .questions
        .iter()
        .flat_map(|q| &q.options)
        .all(|o| o.voters.is_empty()));
    assert!(h.bus.named(NEW_VOTE_CREATED).is_empty());
}

#[tokio::test]
async fn unknown_question_is_invalid() {
    let h = harness().await;
    let v = voter(&h.store).await;
    let stray = Uuid::new_v4();

    let err = h
        .deps
        .polls()
        .submit_vote(
            v.id,
            h.challenge.id,
            BTreeMap::from([(stray, Uuid::new_v4())]),
            before_start(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, SidelineError::InvalidOption { question_id: stray });
}

#[tokio::test]
async fn empty_answers_are_rejected() {
    let h = harness().await;
    let v = voter(&h.store).await;

    let err = h
        .deps
        .polls()
        .submit_vote(v.id, h.challenge.id, BTreeMap::new(), before_start())
        .await
        .unwrap_err();
    assert!(matches!(err, SidelineError::Validation(_)));
}

#[tokio::test]
async fn voting_closes_at_the_effective_start() {
    let h = harness().await;
    let v = voter(&h.store).await;
    let (q1, x) = answer(&h.challenge, 0, 0);
    let polls = h.deps.polls();

    for now in [
        effective_start(),
        effective_start() + Duration::hours(1),
        h.challenge.end_date + Duration::days(1),
    ] {
        let err = polls
            .submit_vote(v.id, h.challenge.id, BTreeMap::from([(q1, x)]), now)
            .await
            .unwrap_err();
        assert_eq!(err, SidelineError::VotingClosed);
    }
    assert_eq!(stored(&h).await.vote_count(), 0);
}

#[tokio::test]
async fn vote_requires_challenge_and_voter() {
    let h = harness().await;
    let v = voter(&h.store).await;
    let (q1, x) = answer(&h.challenge, 0, 0);
    let polls = h.deps.polls();

    assert!(matches!(
        polls
            .submit_vote(v.id, Uuid::new_v4(), BTreeMap::from([(q1, x)]), before_start())
            .await,
        Err(SidelineError::NotFound(_))
    ));
    assert!(matches!(
        polls
            .submit_vote(Uuid::new_v4(), h.challenge.id, BTreeMap::from([(q1, x)]), before_start())
            .await,
        Err(SidelineError::NotFound(_))
    ));
}

#[tokio::test]
async fn tallies_match_votes_per_question() {
    let h = harness().await;
    let polls = h.deps.polls();

    for i in 0..7 {
        let v = voter(&h.store).await;
        let mut answers = BTreeMap::from([answer(&h.challenge, 0, i % 2)]);
        // Only some voters answer the second question.
        if i % 3 == 0 {
            answers.extend([answer(&h.challenge, 1, 0)]);
        }
        polls
            .submit_vote(v.id, h.challenge.id, answers, before_start())
            .await
            .unwrap();
    }

    let c = stored(&h).await;
    let votes = h.store.votes_for(c.id).await;
    for question in &c.questions {
        let tallied: u64 = question.options.iter().map(|o| o.voters.size()).sum();
        let answered = votes
            .iter()
            .filter(|v| v.answers.contains_key(&question.id))
            .count() as u64;
        assert_eq!(tallied, answered, "question {}", question.text);
    }
    assert_eq!(c.vote_count(), 7);
}

#[tokio::test]
async fn vote_event_carries_the_voter_summary() {
    let h = harness().await;
    let v = voter(&h.store).await;
    let (q1, x) = answer(&h.challenge, 0, 0);

    let vote = h
        .deps
        .polls()
        .submit_vote(v.id, h.challenge.id, BTreeMap::from([(q1, x)]), before_start())
        .await
        .unwrap();

    let events = h.bus.named(NEW_VOTE_CREATED);
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].payload,
        json!({
            "_id": vote.id,
            "user": {
                "_id": v.id,
                "username": "fan",
                "avatarUrl": "https://cdn.example/fan.png",
            },
            "answers": { q1.to_string(): x },
        })
    );
}

// =========================================================================
// Listing & results
// =========================================================================

#[tokio::test]
async fn votes_list_newest_first() {
    let h = harness().await;
    let polls = h.deps.polls();
    let mut ids = Vec::new();
    for i in 0..3 {
        let v = voter(&h.store).await;
        let vote = polls
            .submit_vote(
                v.id,
                h.challenge.id,
                BTreeMap::from([answer(&h.challenge, 0, 0)]),
                before_start() + Duration::minutes(i),
            )
            .await
            .unwrap();
        ids.push(vote.id);
    }
    ids.reverse();

    let listed = polls.list_votes(h.challenge.id, Page::default()).await.unwrap();
    assert_eq!(listed.iter().map(|v| v.id).collect::<Vec<_>>(), ids);

    let err = polls.list_votes(Uuid::new_v4(), Page::default()).await.unwrap_err();
    assert!(matches!(err, SidelineError::NotFound(_)));
}

#[tokio::test]
async fn results_report_state_and_tallies() {
    let h = harness().await;
    let polls = h.deps.polls();
    let v = voter(&h.store).await;
    polls
        .submit_vote(
            v.id,
            h.challenge.id,
            BTreeMap::from([answer(&h.challenge, 0, 1)]),
            before_start(),
        )
        .await
        .unwrap();

    let open = polls.results(h.challenge.id, before_start()).await.unwrap();
    assert_eq!(open.state, ChallengeState::Scheduled);
    assert_eq!(open.vote_count, 1);
    assert_eq!(open.questions[0].options[1].votes, 1);
    assert_eq!(open.questions[0].options[0].votes, 0);

    let locked = polls.results(h.challenge.id, effective_start()).await.unwrap();
    assert_eq!(locked.state, ChallengeState::Locked);
}

// =========================================================================
// Challenge creation
// =========================================================================

#[tokio::test]
async fn only_owners_create_challenges() {
    let h = harness().await;
    let fan = voter(&h.store).await;

    let err = h
        .deps
        .polls()
        .create_challenge(fan.id, new_challenge(), before_start())
        .await
        .unwrap_err();
    assert!(matches!(err, SidelineError::Authorization(_)));
}

#[tokio::test]
async fn created_challenge_is_announced() {
    let h = harness().await;

    let events = h.bus.named(NEW_CHALLENGE_CREATED);
    assert_eq!(events.len(), 1);
    let payload = &events[0].payload;
    assert_eq!(payload["_id"], json!(h.challenge.id));
    assert_eq!(payload["user"]["username"], json!("club"));
    assert_eq!(payload["title"], json!("Derby day"));
    assert_eq!(payload["questions"].as_array().unwrap().len(), 2);
    assert_eq!(payload["startDate"], json!("2026-07-01T00:00:00.000Z"));
}
