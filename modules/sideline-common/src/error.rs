use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SidelineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid option for question {question_id}")]
    InvalidOption { question_id: Uuid },

    #[error("You cannot follow yourself")]
    SelfReference,

    #[error("User has already voted on this challenge")]
    DuplicateVote,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Voting is closed for this challenge")]
    VotingClosed,

    #[error("Forbidden: {0}")]
    Authorization(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SidelineError {
    pub fn not_found(what: &str, id: Uuid) -> Self {
        SidelineError::NotFound(format!("{what} {id}"))
    }
}
