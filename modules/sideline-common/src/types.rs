use std::collections::BTreeMap;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::counted_set::CountedSet;

pub type AccountId = Uuid;
pub type ContentId = Uuid;
pub type ChallengeId = Uuid;
pub type QuestionId = Uuid;
pub type OptionId = Uuid;
pub type VoteId = Uuid;

// --- Accounts ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: AccountId,
    pub username: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub following: CountedSet<AccountId>,
    #[serde(default)]
    pub followers: CountedSet<AccountId>,
    /// Expo push token. Never broadcast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_address: Option<String>,
}

impl Account {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            avatar_url: None,
            is_owner: false,
            following: CountedSet::new(),
            followers: CountedSet::new(),
            notification_address: None,
        }
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    pub fn as_owner(mut self) -> Self {
        self.is_owner = true;
        self
    }

    pub fn with_notification_address(mut self, address: impl Into<String>) -> Self {
        self.notification_address = Some(address.into());
        self
    }
}

// --- Content ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Post,
    Analysis,
    News,
}

impl ContentKind {
    /// Payload key that identifies this kind of content on the wire.
    pub fn id_key(&self) -> &'static str {
        match self {
            ContentKind::Post => "postId",
            ContentKind::Analysis => "analysisId",
            ContentKind::News => "newsId",
        }
    }

    /// News items carry a second reaction (the "unlike" set).
    pub fn has_secondary_reaction(&self) -> bool {
        matches!(self, ContentKind::News)
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Post => write!(f, "post"),
            ContentKind::Analysis => write!(f, "analysis"),
            ContentKind::News => write!(f, "news"),
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ContentKind::Post),
            "analysis" => Ok(ContentKind::Analysis),
            "news" => Ok(ContentKind::News),
            other => Err(format!("unknown content kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(rename = "_id")]
    pub id: ContentId,
    pub kind: ContentKind,
    pub owner_id: AccountId,
    #[serde(default)]
    pub likes: CountedSet<AccountId>,
    #[serde(default)]
    pub dislikes: CountedSet<AccountId>,
    pub created_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn new(kind: ContentKind, owner_id: AccountId) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            owner_id,
            likes: CountedSet::new(),
            dislikes: CountedSet::new(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl std::fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReactionKind::Like => write!(f, "like"),
            ReactionKind::Dislike => write!(f, "dislike"),
        }
    }
}

impl std::str::FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            other => Err(format!("unknown reaction kind: {other}")),
        }
    }
}

/// One active like or dislike. Unique per (actor, content, kind).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub actor_id: AccountId,
    pub content_id: ContentId,
    pub kind: ReactionKind,
    pub created_at: DateTime<Utc>,
}

// --- Challenges ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    #[serde(rename = "_id")]
    pub id: OptionId,
    pub label: String,
    #[serde(default)]
    pub voters: CountedSet<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<PollOption>,
}

impl Question {
    pub fn option(&self, option_id: OptionId) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    #[serde(rename = "_id")]
    pub id: ChallengeId,
    pub owner_id: AccountId,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub time_of_day: NaiveTime,
    #[serde(default)]
    pub voters: CountedSet<AccountId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    pub fn question(&self, question_id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn vote_count(&self) -> u64 {
        self.voters.size()
    }

    /// `start_date`'s UTC calendar date combined with `time_of_day`.
    /// Voting closes at this instant.
    pub fn effective_start(&self) -> DateTime<Utc> {
        self.start_date
            .date_naive()
            .and_time(self.time_of_day)
            .and_utc()
    }
}

/// A recorded ballot. Created once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: VoteId,
    pub voter_id: AccountId,
    pub challenge_id: ChallengeId,
    pub answers: BTreeMap<QuestionId, OptionId>,
    pub created_at: DateTime<Utc>,
}

// --- Pagination ---

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn new(number: Option<u32>, size: Option<u32>) -> Self {
        Self {
            number: number.filter(|n| *n > 0).unwrap_or(1),
            size: size
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.number as usize - 1) * self.size as usize
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}
