//! PollEngine: time-gated, one-vote-per-user challenges.
//!
//! A challenge accepts votes only while Scheduled. The (voter, challenge)
//! unique index in the store is the real duplicate guard; the `find_vote`
//! lookup before insert only saves a round trip.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use sideline_common::{
    AccountId, Challenge, ChallengeId, CountedSet, OptionId, Page, PollOption, Question,
    QuestionId, SidelineError, Vote,
};
use sideline_events::{ChallengeCreator, EngagementEvent, VoterSummary};
use sideline_store::{AtomicUpdate, DocKey, SetField, StoreError};

use crate::deps::EngagementDeps;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeState {
    /// Before the effective start. Voting open.
    Scheduled,
    /// Between effective start and end date. Results visible, no voting.
    Locked,
    /// Past the end date or deactivated.
    Closed,
}

impl ChallengeState {
    pub fn at(challenge: &Challenge, now: DateTime<Utc>) -> Self {
        if !challenge.is_active || now >= challenge.end_date {
            ChallengeState::Closed
        } else if now >= challenge.effective_start() {
            ChallengeState::Locked
        } else {
            ChallengeState::Scheduled
        }
    }

    pub fn accepts_votes(&self) -> bool {
        matches!(self, ChallengeState::Scheduled)
    }
}

/// Input for `create_challenge`. Ids are assigned server-side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub questions: Vec<NewQuestion>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Defaults to the time component of `start_date`.
    #[serde(default)]
    pub time_of_day: Option<NaiveTime>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub text: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub option_id: OptionId,
    pub label: String,
    pub votes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTally {
    pub question_id: QuestionId,
    pub text: String,
    pub options: Vec<OptionTally>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResults {
    pub challenge_id: ChallengeId,
    pub state: ChallengeState,
    pub vote_count: u64,
    pub questions: Vec<QuestionTally>,
}

pub struct PollEngine {
    deps: EngagementDeps,
}

impl PollEngine {
    pub fn new(deps: EngagementDeps) -> Self {
        Self { deps }
    }

    pub async fn submit_vote(
        &self,
        voter_id: AccountId,
        challenge_id: ChallengeId,
        answers: BTreeMap<QuestionId, OptionId>,
        now: DateTime<Utc>,
    ) -> Result<Vote, SidelineError> {
        let store = &self.deps.store;

        let challenge = self.challenge(challenge_id).await?;
        let voter = store
            .find_account(voter_id)
            .await?
            .ok_or_else(|| SidelineError::not_found("account", voter_id))?;

        let state = ChallengeState::at(&challenge, now);
        if !state.accepts_votes() {
            return Err(SidelineError::VotingClosed);
        }

        if answers.is_empty() {
            return Err(SidelineError::Validation("answers must not be empty".into()));
        }

        let mut update = AtomicUpdate::new(DocKey::Challenge(challenge_id));
        for (&question_id, &option_id) in &answers {
            let belongs = challenge
                .question(question_id)
                .and_then(|q| q.option(option_id))
                .is_some();
            if !belongs {
                return Err(SidelineError::InvalidOption { question_id });
            }
            update = update.add(
                SetField::OptionVoters {
                    question_id,
                    option_id,
                },
                voter_id,
            );
        }
        let update = update.add(SetField::ChallengeVoters, voter_id);

        if store.find_vote(voter_id, challenge_id).await?.is_some() {
            return Err(SidelineError::DuplicateVote);
        }

        let vote = Vote {
            id: Uuid::new_v4(),
            voter_id,
            challenge_id,
            answers,
            created_at: now,
        };

        let applied = store.insert_vote(&vote, update).await.map_err(|e| match e {
            StoreError::Conflict(constraint) => {
                warn!(
                    voter = %voter_id,
                    challenge = %challenge_id,
                    %constraint,
                    "Concurrent duplicate vote rejected by unique index"
                );
                SidelineError::DuplicateVote
            }
            other => other.into(),
        })?;

        let vote_count = applied
            .document
            .into_challenge()
            .map(|c| c.vote_count())
            .unwrap_or_default();
        info!(
            vote = %vote.id,
            voter = %voter_id,
            challenge = %challenge_id,
            vote_count,
            "Vote recorded"
        );

        self.deps.bus.publish(&EngagementEvent::VoteRecorded {
            vote_id: vote.id,
            voter: VoterSummary::from(&voter),
            answers: vote.answers.clone(),
        });

        Ok(vote)
    }

    /// Votes for a challenge, newest first.
    pub async fn list_votes(
        &self,
        challenge_id: ChallengeId,
        page: Page,
    ) -> Result<Vec<Vote>, SidelineError> {
        self.challenge(challenge_id).await?;
        Ok(self.deps.store.list_votes(challenge_id, page).await?)
    }

    pub async fn create_challenge(
        &self,
        owner_id: AccountId,
        input: NewChallenge,
        now: DateTime<Utc>,
    ) -> Result<Challenge, SidelineError> {
        let owner = self
            .deps
            .store
            .find_account(owner_id)
            .await?
            .ok_or_else(|| SidelineError::not_found("account", owner_id))?;
        if !owner.is_owner {
            return Err(SidelineError::Authorization(
                "only owners can create challenges".into(),
            ));
        }

        let challenge = build_challenge(owner_id, input, now)?;
        self.deps.store.insert_challenge(&challenge).await?;

        info!(
            challenge = %challenge.id,
            owner = %owner_id,
            questions = challenge.questions.len(),
            "Challenge created"
        );

        self.deps.bus.publish(&EngagementEvent::ChallengeCreated {
            challenge_id: challenge.id,
            creator: ChallengeCreator::from(&owner),
            title: challenge.title.clone(),
            description: challenge.description.clone(),
            questions: challenge.questions.clone(),
            start_date: challenge.start_date,
            end_date: challenge.end_date,
        });

        Ok(challenge)
    }

    pub async fn results(
        &self,
        challenge_id: ChallengeId,
        now: DateTime<Utc>,
    ) -> Result<ChallengeResults, SidelineError> {
        let challenge = self.challenge(challenge_id).await?;
        Ok(ChallengeResults {
            challenge_id,
            state: ChallengeState::at(&challenge, now),
            vote_count: challenge.vote_count(),
            questions: challenge
                .questions
                .iter()
                .map(|q| QuestionTally {
                    question_id: q.id,
                    text: q.text.clone(),
                    options: q
                        .options
                        .iter()
                        .map(|o| OptionTally {
                            option_id: o.id,
                            label: o.label.clone(),
                            votes: o.voters.size(),
                        })
                        .collect(),
                })
                .collect(),
        })
    }

    async fn challenge(&self, id: ChallengeId) -> Result<Challenge, SidelineError> {
        self.deps
            .store
            .find_challenge(id)
            .await?
            .ok_or_else(|| SidelineError::not_found("challenge", id))
    }
}

fn build_challenge(
    owner_id: AccountId,
    input: NewChallenge,
    now: DateTime<Utc>,
) -> Result<Challenge, SidelineError> {
    let invalid = |msg: &str| SidelineError::Validation(msg.to_string());

    if input.title.trim().is_empty() {
        return Err(invalid("title is required"));
    }
    if input.description.trim().is_empty() {
        return Err(invalid("description is required"));
    }
    if input.questions.is_empty() {
        return Err(invalid("a challenge needs at least one question"));
    }

    let mut questions = Vec::with_capacity(input.questions.len());
    for q in input.questions {
        if q.text.trim().is_empty() {
            return Err(invalid("question text is required"));
        }
        if q.options.len() < 2 {
            return Err(invalid("every question needs at least two options"));
        }
        if q.options.iter().any(|label| label.trim().is_empty()) {
            return Err(invalid("option labels must not be blank"));
        }
        questions.push(Question {
            id: Uuid::new_v4(),
            text: q.text.trim().to_string(),
            options: q
                .options
                .into_iter()
                .map(|label| PollOption {
                    id: Uuid::new_v4(),
                    label: label.trim().to_string(),
                    voters: CountedSet::new(),
                })
                .collect(),
        });
    }

    let challenge = Challenge {
        id: Uuid::new_v4(),
        owner_id,
        title: input.title.trim().to_string(),
        description: input.description.trim().to_string(),
        questions,
        start_date: input.start_date,
        end_date: input.end_date,
        time_of_day: input.time_of_day.unwrap_or_else(|| input.start_date.time()),
        voters: CountedSet::new(),
        is_active: true,
        created_at: now,
    };

    if challenge.effective_start() >= challenge.end_date {
        return Err(invalid("start must be before end"));
    }
    Ok(challenge)
}
