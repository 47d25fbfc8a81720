use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use sideline_common::{Challenge, OptionId, Page, QuestionId, Vote};
use sideline_engagement::{ChallengeResults, NewChallenge};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Deserialize)]
pub struct VoteRequest {
    answers: BTreeMap<QuestionId, OptionId>,
}

#[derive(Deserialize)]
pub struct VotesQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

/// Owner-only.
pub async fn api_register_challenge(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    ApiJson(body): ApiJson<NewChallenge>,
) -> Result<(StatusCode, Json<Challenge>), ApiError> {
    let challenge = state
        .deps
        .polls()
        .create_challenge(caller, body, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(challenge)))
}

pub async fn api_submit_vote(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<VoteRequest>,
) -> Result<(StatusCode, Json<Vote>), ApiError> {
    let vote = state
        .deps
        .polls()
        .submit_vote(caller, id, body.answers, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(vote)))
}

pub async fn api_list_votes(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<VotesQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = Page::new(params.page, params.limit);
    let votes = state.deps.polls().list_votes(id, page).await?;
    Ok(Json(json!({
        "page": page.number,
        "limit": page.size,
        "votes": votes,
    })))
}

pub async fn api_results(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ChallengeResults>, ApiError> {
    let results = state.deps.polls().results(id, Utc::now()).await?;
    Ok(Json(results))
}
