use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use sideline_common::SidelineError;
use sideline_engagement::FollowOutcome;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushTokenRequest {
    expo_push_token: Option<String>,
}

/// Toggle the caller's follow of `user_id`.
pub async fn api_toggle_follow(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<FollowOutcome>, ApiError> {
    let outcome = state.deps.ledger().toggle_follow(caller, user_id).await?;
    Ok(Json(outcome))
}

/// Register (or clear, with `null`) the caller's own Expo push token.
pub async fn api_set_push_token(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<PushTokenRequest>,
) -> Result<Json<Value>, ApiError> {
    if caller != user_id {
        return Err(ApiError(SidelineError::Authorization(
            "you can only set your own push token".into(),
        )));
    }
    let enabled = body.expo_push_token.is_some();
    state
        .deps
        .ledger()
        .set_notification_address(user_id, body.expo_push_token)
        .await?;
    Ok(Json(json!({ "notificationsEnabled": enabled })))
}
