use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
};
use chrono::Utc;
use uuid::Uuid;

use sideline_common::{ContentId, ContentKind, SidelineError};
use sideline_engagement::{EngagementReport, ReactionOutcome};

use super::parse_kind;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::AppState;

/// The item must exist under the kind named in the path.
async fn ensure_kind(state: &AppState, kind: ContentKind, id: ContentId) -> Result<(), ApiError> {
    let item = state
        .deps
        .store
        .find_content(id)
        .await
        .map_err(SidelineError::from)?;
    match item {
        Some(item) if item.kind == kind => Ok(()),
        _ => Err(ApiError(SidelineError::not_found(&kind.to_string(), id))),
    }
}

pub async fn api_toggle_like(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    ApiPath((kind, id)): ApiPath<(String, Uuid)>,
) -> Result<Json<ReactionOutcome>, ApiError> {
    let kind = parse_kind(&kind)?;
    ensure_kind(&state, kind, id).await?;
    let outcome = state.deps.ledger().toggle_like(caller, id).await?;
    Ok(Json(outcome))
}

pub async fn api_toggle_news_like(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ReactionOutcome>, ApiError> {
    ensure_kind(&state, ContentKind::News, id).await?;
    let outcome = state.deps.ledger().toggle_like(caller, id).await?;
    Ok(Json(outcome))
}

/// News-only secondary reaction.
pub async fn api_toggle_unlike(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ReactionOutcome>, ApiError> {
    ensure_kind(&state, ContentKind::News, id).await?;
    let outcome = state.deps.ledger().toggle_dislike(caller, id).await?;
    Ok(Json(outcome))
}

pub async fn api_engagement(
    State(state): State<Arc<AppState>>,
    ApiPath((kind, id)): ApiPath<(String, Uuid)>,
) -> Result<Json<EngagementReport>, ApiError> {
    let kind = parse_kind(&kind)?;
    engagement(&state, kind, id).await
}

pub async fn api_news_engagement(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<EngagementReport>, ApiError> {
    engagement(&state, ContentKind::News, id).await
}

async fn engagement(
    state: &AppState,
    kind: ContentKind,
    id: ContentId,
) -> Result<Json<EngagementReport>, ApiError> {
    ensure_kind(state, kind, id).await?;
    let report = state.deps.ledger().engagement_report(id, Utc::now()).await?;
    Ok(Json(report))
}
