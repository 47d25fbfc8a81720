//! Event catalogue. Names and payload keys must not change: mobile clients
//! subscribe to these exact strings.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use sideline_common::{Account, ContentKind, OptionId, Question, QuestionId};

use crate::types::PublishedEvent;

pub const NEW_FOLLOWER: &str = "new follower";
pub const NEW_LIKE_CREATED: &str = "new like created";
pub const NEW_UNLIKE_CREATED: &str = "new unlike created";
pub const NEW_VOTE_CREATED: &str = "new vote created";
pub const NEW_CHALLENGE_CREATED: &str = "new challenge created";
pub const USER_PROFILE_UPDATED: &str = "userProfileUpdated";

/// The voter as shown next to a vote.
#[derive(Debug, Clone, PartialEq)]
pub struct VoterSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl From<&Account> for VoterSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            avatar_url: account.avatar_url.clone(),
        }
    }
}

/// The challenge owner as shown on a new challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeCreator {
    pub id: Uuid,
    pub username: String,
    pub profile_picture: Option<String>,
}

impl From<&Account> for ChallengeCreator {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            profile_picture: account.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngagementEvent {
    FollowToggled {
        user_id: Uuid,
        follower_id: Uuid,
        followed: bool,
    },
    LikeToggled {
        content_kind: ContentKind,
        content_id: Uuid,
        user_id: Uuid,
        liked: bool,
    },
    DislikeToggled {
        content_id: Uuid,
        user_id: Uuid,
        unliked: bool,
    },
    VoteRecorded {
        vote_id: Uuid,
        voter: VoterSummary,
        answers: BTreeMap<QuestionId, OptionId>,
    },
    ChallengeCreated {
        challenge_id: Uuid,
        creator: ChallengeCreator,
        title: String,
        description: String,
        questions: Vec<Question>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    },
    ProfileUpdated {
        user_id: Uuid,
        updated_fields: Value,
    },
}

impl EngagementEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            EngagementEvent::FollowToggled { .. } => NEW_FOLLOWER,
            EngagementEvent::LikeToggled { .. } => NEW_LIKE_CREATED,
            EngagementEvent::DislikeToggled { .. } => NEW_UNLIKE_CREATED,
            EngagementEvent::VoteRecorded { .. } => NEW_VOTE_CREATED,
            EngagementEvent::ChallengeCreated { .. } => NEW_CHALLENGE_CREATED,
            EngagementEvent::ProfileUpdated { .. } => USER_PROFILE_UPDATED,
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            EngagementEvent::FollowToggled {
                user_id,
                follower_id,
                followed,
            } => json!({
                "userId": user_id,
                "followerId": follower_id,
                "followed": followed,
            }),
            EngagementEvent::LikeToggled {
                content_kind,
                content_id,
                user_id,
                liked,
            } => {
                let mut payload = serde_json::Map::new();
                payload.insert(content_kind.id_key().to_string(), json!(content_id));
                payload.insert("userId".to_string(), json!(user_id));
                payload.insert("liked".to_string(), json!(liked));
                Value::Object(payload)
            }
            EngagementEvent::DislikeToggled {
                content_id,
                user_id,
                unliked,
            } => json!({
                "newsId": content_id,
                "userId": user_id,
                "unliked": unliked,
            }),
            EngagementEvent::VoteRecorded {
                vote_id,
                voter,
                answers,
            } => json!({
                "_id": vote_id,
                "user": {
                    "_id": voter.id,
                    "username": voter.username,
                    "avatarUrl": voter.avatar_url,
                },
                "answers": answers,
            }),
            EngagementEvent::ChallengeCreated {
                challenge_id,
                creator,
                title,
                description,
                questions,
                start_date,
                end_date,
            } => json!({
                "_id": challenge_id,
                "user": {
                    "id": creator.id,
                    "username": creator.username,
                    "profilePicture": creator.profile_picture,
                },
                "title": title,
                "description": description,
                "questions": questions.iter().map(question_view).collect::<Vec<_>>(),
                "startDate": start_date.to_rfc3339_opts(SecondsFormat::Millis, true),
                "endDate": end_date.to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
            EngagementEvent::ProfileUpdated {
                user_id,
                updated_fields,
            } => json!({
                "userId": user_id,
                "updatedFields": updated_fields,
            }),
        }
    }

    pub fn to_published(&self) -> PublishedEvent {
        PublishedEvent::new(self.event_name(), self.payload())
    }
}

// Tallies are not part of the announcement; a fresh challenge has none.
fn question_view(question: &Question) -> Value {
    json!({
        "_id": question.id,
        "text": question.text,
        "options": question
            .options
            .iter()
            .map(|o| json!({"_id": o.id, "label": o.label}))
            .collect::<Vec<_>>(),
    })
}
